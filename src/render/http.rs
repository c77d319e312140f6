//! HTTP-fetch renderer
//!
//! Renders pages by fetching them over HTTP and parsing the returned markup.
//! Pages served this way are static: whatever the server sent is the final
//! document, so selector waits resolve against the parsed tree rather than a
//! live browser.

use super::{PageRenderer, RenderError, RenderedPage, SelectorSpec};
use crate::config::Cookie;
use crate::render::xpath;
use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client};
use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Subtrees skipped during readable-text extraction
const EXCLUDED_ELEMENTS: &[&str] = &["header", "footer", "nav", "script", "style", "noscript"];

/// Builds the HTTP client used for page fetches
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("gleaner/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer backed by plain HTTP fetches
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
    cookie_header: Option<String>,
}

impl HttpRenderer {
    /// Creates a renderer; `cookies` ride along on every page fetch
    pub fn new(cookies: &[Cookie]) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client()?,
            cookie_header: build_cookie_header(cookies),
        })
    }
}

fn build_cookie_header(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &Url) -> Result<Box<dyn RenderedPage>, RenderError> {
        let mut request = self.client.get(url.clone());
        if let Some(cookie_header) = &self.cookie_header {
            request = request.header(header::COOKIE, cookie_header);
        }

        let response = request.send().await.map_err(|source| RenderError::Navigation {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let raw_html = response
            .text()
            .await
            .map_err(|source| RenderError::Navigation {
                url: url.to_string(),
                source,
            })?;

        Ok(Box::new(HtmlPage::new(final_url, raw_html)))
    }
}

/// A fetched HTML document
///
/// Holds the raw source and re-parses it per evaluation; the parsed tree is
/// a thread-local type and cannot live inside a handle that crosses workers.
pub struct HtmlPage {
    final_url: Url,
    raw_html: String,
}

impl HtmlPage {
    pub fn new(final_url: Url, raw_html: String) -> Self {
        Self { final_url, raw_html }
    }

    fn selector_matches(&self, selector: &SelectorSpec) -> Result<bool, RenderError> {
        let document = Html::parse_document(&self.raw_html);
        match selector {
            SelectorSpec::Css(css) => {
                let parsed = Selector::parse(css).map_err(|_| RenderError::Selector {
                    selector: css.clone(),
                })?;
                Ok(document.select(&parsed).next().is_some())
            }
            SelectorSpec::XPath(expression) => {
                Ok(!xpath::select(&document, expression)?.is_empty())
            }
        }
    }
}

#[async_trait]
impl RenderedPage for HtmlPage {
    fn final_url(&self) -> &Url {
        &self.final_url
    }

    fn title(&self) -> Option<String> {
        let document = Html::parse_document(&self.raw_html);
        let selector = Selector::parse("title").ok()?;

        document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
    }

    async fn wait_for_selector(
        &self,
        selector: &SelectorSpec,
        timeout: Duration,
    ) -> Result<bool, RenderError> {
        if self.selector_matches(selector)? {
            return Ok(true);
        }

        // A fetched document never changes, so one recheck after the full
        // wait observes everything polling would
        sleep(timeout).await;
        self.selector_matches(selector)
    }

    fn extract_text(&self, selector: Option<&SelectorSpec>) -> Result<String, RenderError> {
        let document = Html::parse_document(&self.raw_html);

        match selector {
            Some(SelectorSpec::Css(css)) => {
                let parsed = Selector::parse(css).map_err(|_| RenderError::Selector {
                    selector: css.clone(),
                })?;
                Ok(document
                    .select(&parsed)
                    .next()
                    .map(collect_readable_text)
                    .unwrap_or_default())
            }
            Some(SelectorSpec::XPath(expression)) => {
                let nodes = xpath::select(&document, expression)?;
                Ok(nodes
                    .first()
                    .map(|node| collect_readable_text(*node))
                    .unwrap_or_default())
            }
            None => {
                let body = Selector::parse("body")
                    .ok()
                    .and_then(|parsed| document.select(&parsed).next());
                Ok(match body {
                    Some(element) => collect_readable_text(element),
                    None => collect_readable_text(document.root_element()),
                })
            }
        }
    }

    fn links(&self) -> Vec<Url> {
        let document = Html::parse_document(&self.raw_html);
        let mut links = Vec::new();

        if let Ok(anchor) = Selector::parse("a[href]") {
            for element in document.select(&anchor) {
                if let Some(href) = element.value().attr("href") {
                    if let Some(resolved) = resolve_link(href, &self.final_url) {
                        links.push(resolved);
                    }
                }
            }
        }

        links
    }

    fn html(&self) -> &str {
        &self.raw_html
    }
}

/// Concatenates text nodes under `root`, skipping excluded subtrees, and
/// collapses whitespace runs to single spaces
fn collect_readable_text(root: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_readable_text(*root, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_readable_text(node: NodeRef<'_, Node>, out: &mut String) {
    if let Node::Element(element) = node.value() {
        if EXCLUDED_ELEMENTS.contains(&element.name()) {
            return;
        }
    }

    if let Node::Text(text) = node.value() {
        out.push_str(&text);
        out.push(' ');
        return;
    }

    for child in node.children() {
        push_readable_text(child, out);
    }
}

/// Resolves a link href to an absolute URL
///
/// Returns None for hrefs that cannot lead to a crawlable page:
/// javascript:, mailto:, tel:, and data: schemes, fragment-only anchors,
/// and anything that does not resolve to http(s).
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) => {
            if absolute.scheme() == "http" || absolute.scheme() == "https" {
                Some(absolute)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
