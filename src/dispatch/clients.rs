//! Downstream service clients
//!
//! The dispatch pipeline talks to three collaborators through narrow traits
//! so tests can substitute in-memory fakes: object storage for file bytes,
//! the metadata store for pending-document rows, and the ingestion webhook
//! for submissions. The HTTP implementations here are the production ones,
//! configured from the `[ingestion]` section.

use super::payload::{IngestSubmission, PendingDocument};
use crate::config::IngestionConfig;
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use thiserror::Error;

/// Errors from one dispatch stage
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Downloading the file bytes failed
    #[error("download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service could not be reached
    #[error("{operation} call failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("{operation} returned HTTP {status}")]
    Rejected { operation: &'static str, status: u16 },
}

/// Stores file bytes under deterministic keys
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key`; overwriting an existing key is allowed
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), DispatchError>;
}

/// Records pending-ingestion rows
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert_pending_document(
        &self,
        document: &PendingDocument,
    ) -> Result<(), DispatchError>;
}

/// Accepts ingestion submissions
#[async_trait]
pub trait IngestSink: Send + Sync {
    async fn submit(&self, submission: &IngestSubmission) -> Result<(), DispatchError>;
}

fn check_status(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<(), DispatchError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(DispatchError::Rejected {
            operation,
            status: status.as_u16(),
        })
    }
}

fn with_auth(request: RequestBuilder, auth_token: &Option<String>) -> RequestBuilder {
    match auth_token {
        Some(token) => request.header(header::AUTHORIZATION, format!("Basic {}", token)),
        None => request,
    }
}

/// Object storage over its HTTP API: PUT `<storage-url>/<bucket>/<key>`
pub struct HttpObjectStore {
    http: Client,
    base_url: String,
    bucket: String,
}

impl HttpObjectStore {
    pub fn new(http: Client, config: &IngestionConfig) -> Self {
        Self {
            http,
            base_url: config.storage_url.trim_end_matches('/').to_string(),
            bucket: config.storage_bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), DispatchError> {
        let target = format!("{}/{}/{}", self.base_url, self.bucket, key);
        let response = self
            .http
            .put(&target)
            .body(bytes)
            .send()
            .await
            .map_err(|source| DispatchError::Transport {
                operation: "storage upload",
                source,
            })?;
        check_status("storage upload", response)
    }
}

/// Metadata store over HTTP: POST one pending-document row
pub struct HttpMetadataStore {
    http: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpMetadataStore {
    pub fn new(http: Client, config: &IngestionConfig) -> Self {
        Self {
            http,
            endpoint: config.metadata_url.clone(),
            auth_token: config.auth_token.clone(),
        }
    }
}

#[async_trait]
impl MetadataStore for HttpMetadataStore {
    async fn insert_pending_document(
        &self,
        document: &PendingDocument,
    ) -> Result<(), DispatchError> {
        let request = with_auth(self.http.post(&self.endpoint), &self.auth_token);
        let response = request.json(document).send().await.map_err(|source| {
            DispatchError::Transport {
                operation: "metadata insert",
                source,
            }
        })?;
        check_status("metadata insert", response)
    }
}

/// Ingestion webhook over HTTP: POST one submission
pub struct HttpIngestSink {
    http: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpIngestSink {
    pub fn new(http: Client, config: &IngestionConfig) -> Self {
        Self {
            http,
            endpoint: config.ingest_url.clone(),
            auth_token: config.auth_token.clone(),
        }
    }
}

#[async_trait]
impl IngestSink for HttpIngestSink {
    async fn submit(&self, submission: &IngestSubmission) -> Result<(), DispatchError> {
        let request = with_auth(self.http.post(&self.endpoint), &self.auth_token);
        let response = request.json(submission).send().await.map_err(|source| {
            DispatchError::Transport {
                operation: "ingest submit",
                source,
            }
        })?;
        check_status("ingest submit", response)
    }
}
