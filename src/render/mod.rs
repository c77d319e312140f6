//! Page rendering abstraction
//!
//! The crawl loop never talks to the network directly for page content; it
//! goes through [`PageRenderer`], which turns a URL into a [`RenderedPage`]
//! handle supporting title lookup, selector waits, text extraction, and link
//! discovery. The production implementation is a plain HTTP fetch plus HTML
//! parsing ([`HttpRenderer`]); tests substitute in-memory pages.

mod http;
pub mod xpath;

pub use http::{build_http_client, HtmlPage, HttpRenderer};
pub use xpath::XPathError;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors from rendering a page or evaluating a selector against it
#[derive(Error, Debug)]
pub enum RenderError {
    /// The fetch failed before a response body was read
    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// A configured CSS selector could not be parsed
    #[error("invalid CSS selector {selector:?}")]
    Selector { selector: String },

    #[error(transparent)]
    XPath(#[from] XPathError),
}

/// A content selector from configuration, classified by syntax
///
/// Expressions starting with `/` are XPath location paths; everything else
/// is treated as a CSS selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorSpec {
    Css(String),
    XPath(String),
}

impl SelectorSpec {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('/') {
            SelectorSpec::XPath(trimmed.to_string())
        } else {
            SelectorSpec::Css(trimmed.to_string())
        }
    }

    /// The expression as configured
    pub fn as_str(&self) -> &str {
        match self {
            SelectorSpec::Css(expression) | SelectorSpec::XPath(expression) => expression,
        }
    }
}

/// Turns URLs into rendered page handles
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Loads a page, following redirects
    async fn render(&self, url: &Url) -> Result<Box<dyn RenderedPage>, RenderError>;
}

/// A loaded page, ready for inspection
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// The URL the page actually loaded from, after redirects
    fn final_url(&self) -> &Url;

    /// The document title, trimmed; None when missing or empty
    fn title(&self) -> Option<String>;

    /// Waits up to `timeout` for the selector to match at least one node
    ///
    /// Returns Ok(false) when the timeout elapses without a match.
    async fn wait_for_selector(
        &self,
        selector: &SelectorSpec,
        timeout: Duration,
    ) -> Result<bool, RenderError>;

    /// Readable text for the selected subtree, or the whole body without one
    ///
    /// Header, footer, nav, script, and style subtrees are skipped and runs
    /// of whitespace collapse to single spaces.
    fn extract_text(&self, selector: Option<&SelectorSpec>) -> Result<String, RenderError>;

    /// Absolute http(s) links discovered in the document
    fn links(&self) -> Vec<Url>;

    /// The raw HTML source
    fn html(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_spec_css() {
        assert_eq!(
            SelectorSpec::parse("main .content"),
            SelectorSpec::Css("main .content".to_string())
        );
    }

    #[test]
    fn test_selector_spec_xpath() {
        assert_eq!(
            SelectorSpec::parse("/html/body/div"),
            SelectorSpec::XPath("/html/body/div".to_string())
        );
        assert_eq!(
            SelectorSpec::parse("//article"),
            SelectorSpec::XPath("//article".to_string())
        );
    }

    #[test]
    fn test_selector_spec_trims() {
        assert_eq!(
            SelectorSpec::parse("  #main  "),
            SelectorSpec::Css("#main".to_string())
        );
    }
}
