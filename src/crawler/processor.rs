//! Page processing: readiness wait, extraction, classification
//!
//! Given a rendered page handle, the processor waits for the configured
//! selector (when one is set), extracts readable text, runs the optional
//! per-page hook, and classifies the page as HTML content, a PDF, or empty.
//! The caller decides what to do with each classification; the processor
//! never dispatches anything itself.

use crate::config::CrawlConfig;
use crate::render::{RenderError, RenderedPage, SelectorSpec};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors while processing one rendered page
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The configured selector never matched within its wait window
    #[error("selector {selector:?} did not match within {timeout_ms}ms")]
    SelectorTimeout { selector: String, timeout_ms: u64 },

    #[error(transparent)]
    Render(#[from] RenderError),

    /// The per-page hook returned an error
    #[error("page hook failed: {0}")]
    Hook(anyhow::Error),
}

/// What a processed page turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Text-bearing page bound for the ingestion endpoint
    Html,
    /// A PDF bound for storage offload
    Pdf,
    /// No readable text; logged and dropped
    Empty,
}

/// Everything extracted from one visited page
#[derive(Debug, Clone)]
pub struct PageResult {
    pub title: Option<String>,
    pub loaded_url: Url,
    pub text: String,
    pub kind: PageKind,
}

/// Receives content a page hook wants ingested alongside the page itself
#[async_trait]
pub trait ContentPush: Send + Sync {
    async fn push(&self, title: &str, content: &str) -> anyhow::Result<()>;
}

/// Per-page extension point, awaited before the page handle is released
///
/// Hooks see the rendered page and a push capability; they cannot reach the
/// frontier or the crawl loop.
#[async_trait]
pub trait PageVisitHook: Send + Sync {
    async fn visit_page(
        &self,
        page: &dyn RenderedPage,
        push: &dyn ContentPush,
    ) -> anyhow::Result<()>;
}

/// True when the URL path names a PDF
pub fn is_pdf_url(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".pdf")
}

/// Classifies a page by its loaded URL and extracted text
///
/// A `.pdf` path wins regardless of what the text extraction produced.
pub fn classify(loaded_url: &Url, text: &str) -> PageKind {
    if is_pdf_url(loaded_url) {
        PageKind::Pdf
    } else if text.trim().is_empty() {
        PageKind::Empty
    } else {
        PageKind::Html
    }
}

/// Builds the result for a PDF link without rendering it
///
/// PDF bodies are binary; the download happens on the offload path, so
/// there is nothing for the renderer to do.
pub fn pdf_result(url: &Url) -> PageResult {
    PageResult {
        title: None,
        loaded_url: url.clone(),
        text: String::new(),
        kind: PageKind::Pdf,
    }
}

/// Processes one rendered page into a [`PageResult`]
pub async fn process(
    page: &dyn RenderedPage,
    config: &CrawlConfig,
    hook: Option<&dyn PageVisitHook>,
    push: &dyn ContentPush,
) -> Result<PageResult, ProcessError> {
    let selector = config.selector.as_deref().map(SelectorSpec::parse);

    if let Some(spec) = &selector {
        let timeout_ms = config.wait_for_selector_timeout;
        let appeared = page
            .wait_for_selector(spec, Duration::from_millis(timeout_ms))
            .await?;
        if !appeared {
            return Err(ProcessError::SelectorTimeout {
                selector: spec.as_str().to_string(),
                timeout_ms,
            });
        }
    }

    let title = page.title();
    let text = page.extract_text(selector.as_ref())?;

    if let Some(hook) = hook {
        hook.visit_page(page, push).await.map_err(ProcessError::Hook)?;
    }

    let loaded_url = page.final_url().clone();
    let kind = classify(&loaded_url, &text);
    if kind == PageKind::Empty {
        tracing::debug!("No readable text extracted from {}", loaded_url);
    }

    Ok(PageResult {
        title,
        loaded_url,
        text,
        kind,
    })
}
