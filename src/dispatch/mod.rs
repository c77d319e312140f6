//! Dispatch pipeline: forwarding extracted content downstream
//!
//! Every processed page ends here. HTML pages are submitted to the
//! ingestion webhook as extracted text; PDFs are downloaded, uploaded to
//! object storage, recorded in the metadata store, and then announced to
//! the webhook by storage key. All of it is fire-and-forget from the crawl
//! loop's point of view: dispatch failures are logged and swallowed, and
//! the tasks are tracked so a crawl can wait for stragglers before
//! reporting completion.

mod clients;
mod payload;

pub use clients::{
    DispatchError, HttpIngestSink, HttpMetadataStore, HttpObjectStore, IngestSink, MetadataStore,
    ObjectStore,
};
pub use payload::{IngestSubmission, PendingDocument};

use crate::config::CrawlConfig;
use crate::crawler::processor::{ContentPush, PageKind, PageResult};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use url::Url;

/// Routes processed pages to the ingestion and offload paths
#[derive(Clone)]
pub struct Dispatcher {
    http: Client,
    ingest: Arc<dyn IngestSink>,
    store: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
    tasks: TaskTracker,
    base_url: String,
    course_name: String,
    groups: Vec<String>,
}

impl Dispatcher {
    pub fn new(
        http: Client,
        ingest: Arc<dyn IngestSink>,
        store: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        config: &CrawlConfig,
    ) -> Self {
        Self {
            http,
            ingest,
            store,
            metadata,
            tasks: TaskTracker::new(),
            base_url: config.url.clone(),
            course_name: config.course_name.clone(),
            groups: config.document_groups.clone(),
        }
    }

    /// Routes one page result; returns immediately
    pub fn dispatch(&self, result: &PageResult) {
        match result.kind {
            PageKind::Html => self.submit_web_text(result),
            PageKind::Pdf => self.offload_file(result.loaded_url.clone()),
            PageKind::Empty => {
                tracing::debug!("Nothing to dispatch for {}", result.loaded_url);
            }
        }
    }

    /// Submits hook-pushed content for a page, alongside its own submission
    pub fn push_content(&self, page_url: &Url, title: &str, content: &str) {
        let submission = IngestSubmission::web_text(
            &self.base_url,
            page_url.as_str(),
            title,
            content,
            &self.course_name,
            &self.groups,
        );
        self.spawn_submission(submission);
    }

    /// Number of dispatch tasks not yet settled
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for every outstanding dispatch task to settle
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    fn submit_web_text(&self, result: &PageResult) {
        let title = result
            .title
            .clone()
            .unwrap_or_else(|| result.loaded_url.to_string());
        let submission = IngestSubmission::web_text(
            &self.base_url,
            result.loaded_url.as_str(),
            &title,
            &result.text,
            &self.course_name,
            &self.groups,
        );
        self.spawn_submission(submission);
    }

    fn spawn_submission(&self, submission: IngestSubmission) {
        let ingest = Arc::clone(&self.ingest);
        self.tasks.spawn(async move {
            if let Err(e) = ingest.submit(&submission).await {
                tracing::warn!("Ingest submission for {} failed: {}", submission.url, e);
            }
        });
    }

    fn offload_file(&self, url: Url) {
        let dispatcher = self.clone();
        self.tasks.spawn(async move {
            if let Err(e) = dispatcher.offload(&url).await {
                tracing::warn!("File offload for {} failed: {}", url, e);
            }
        });
    }

    /// Download, store, record, notify; stops at the first failing stage
    async fn offload(&self, url: &Url) -> Result<(), DispatchError> {
        let key = format!("courses/{}/{}", self.course_name, sanitize_filename(url));

        let response = self.http.get(url.clone()).send().await.map_err(|source| {
            DispatchError::Download {
                url: url.to_string(),
                source,
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Rejected {
                operation: "file download",
                status: status.as_u16(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| DispatchError::Download {
                url: url.to_string(),
                source,
            })?;

        self.store.put(&key, bytes.to_vec()).await?;

        let document = PendingDocument::stored_file(
            &self.base_url,
            url.as_str(),
            &key,
            &self.course_name,
            &self.groups,
        );
        self.metadata.insert_pending_document(&document).await?;

        let submission = IngestSubmission::stored_file(
            &self.base_url,
            url.as_str(),
            &key,
            &self.course_name,
            &self.groups,
        );
        self.ingest.submit(&submission).await?;

        tracing::info!("Offloaded {} to {}", url, key);
        Ok(())
    }
}

/// Push capability handed to page hooks
///
/// Pushed content rides the same ingestion path as the page itself, under
/// the page's URL.
pub struct ContentSink<'a> {
    dispatcher: &'a Dispatcher,
    page_url: Url,
}

impl<'a> ContentSink<'a> {
    pub fn new(dispatcher: &'a Dispatcher, page_url: Url) -> Self {
        Self {
            dispatcher,
            page_url,
        }
    }
}

#[async_trait]
impl ContentPush for ContentSink<'_> {
    async fn push(&self, title: &str, content: &str) -> anyhow::Result<()> {
        self.dispatcher.push_content(&self.page_url, title, content);
        Ok(())
    }
}

/// Derives a storage-safe filename from a URL
///
/// The percent-decoded basename keeps its extension; every other
/// non-alphanumeric character in the stem becomes a hyphen. URLs without a
/// usable basename map to "file".
///
/// # Example
///
/// ```
/// use gleaner::dispatch::sanitize_filename;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/files/Week%201%20Notes.pdf").unwrap();
/// assert_eq!(sanitize_filename(&url), "Week-1-Notes.pdf");
/// ```
pub fn sanitize_filename(url: &Url) -> String {
    let basename = url
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or("");

    let decoded = match urlencoding::decode(basename) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => basename.to_string(),
    };

    let (stem, extension) = match decoded.rfind('.') {
        Some(dot) if dot > 0 => decoded.split_at(dot),
        _ => (decoded.as_str(), ""),
    };

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    if cleaned.is_empty() {
        return "file".to_string();
    }
    format!("{}{}", cleaned, extension)
}
