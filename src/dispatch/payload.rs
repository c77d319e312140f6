//! Wire shapes for the downstream ingestion services

use serde::Serialize;

/// Body POSTed to the ingestion webhook
///
/// HTML pages carry their extracted text in `content`; offloaded files carry
/// the storage key in `s3_paths` instead. `readable_filename` is the page
/// title for web text and the stored filename for files.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSubmission {
    pub base_url: String,
    pub url: String,
    pub readable_filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_paths: Option<String>,
    pub course_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

impl IngestSubmission {
    /// Submission for an extracted web page
    pub fn web_text(
        base_url: &str,
        url: &str,
        title: &str,
        content: &str,
        course_name: &str,
        groups: &[String],
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            url: url.to_string(),
            readable_filename: title.to_string(),
            content: Some(content.to_string()),
            s3_paths: None,
            course_name: course_name.to_string(),
            groups: groups.to_vec(),
        }
    }

    /// Submission for a file already uploaded to object storage
    pub fn stored_file(
        base_url: &str,
        url: &str,
        s3_key: &str,
        course_name: &str,
        groups: &[String],
    ) -> Self {
        let readable_filename = s3_key.rsplit('/').next().unwrap_or(s3_key).to_string();
        Self {
            base_url: base_url.to_string(),
            url: url.to_string(),
            readable_filename,
            content: None,
            s3_paths: Some(s3_key.to_string()),
            course_name: course_name.to_string(),
            groups: groups.to_vec(),
        }
    }
}

/// Row recorded in the metadata store before a file is ingested
#[derive(Debug, Clone, Serialize)]
pub struct PendingDocument {
    pub base_url: String,
    pub url: String,
    pub readable_filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
    pub course_name: String,
    pub groups: Vec<String>,
}

impl PendingDocument {
    /// Pending row for a file sitting in object storage
    pub fn stored_file(
        base_url: &str,
        url: &str,
        s3_key: &str,
        course_name: &str,
        groups: &[String],
    ) -> Self {
        let readable_filename = s3_key.rsplit('/').next().unwrap_or(s3_key).to_string();
        Self {
            base_url: base_url.to_string(),
            url: url.to_string(),
            readable_filename,
            content: None,
            s3_key: Some(s3_key.to_string()),
            course_name: course_name.to_string(),
            groups: groups.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_text_serializes_content_without_s3_paths() {
        let submission = IngestSubmission::web_text(
            "https://example.com/docs",
            "https://example.com/docs/intro",
            "Intro",
            "lesson text",
            "rust-101",
            &[],
        );

        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["base_url"], "https://example.com/docs");
        assert_eq!(json["readable_filename"], "Intro");
        assert_eq!(json["content"], "lesson text");
        assert!(json.get("s3_paths").is_none());
        assert!(json.get("groups").is_none());
    }

    #[test]
    fn test_stored_file_serializes_key_without_content() {
        let submission = IngestSubmission::stored_file(
            "https://example.com/docs",
            "https://example.com/files/week1.pdf",
            "courses/rust-101/week1.pdf",
            "rust-101",
            &["lectures".to_string()],
        );

        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["readable_filename"], "week1.pdf");
        assert_eq!(json["s3_paths"], "courses/rust-101/week1.pdf");
        assert!(json.get("content").is_none());
        assert_eq!(json["groups"][0], "lectures");
    }

    #[test]
    fn test_pending_document_carries_key_and_groups() {
        let document = PendingDocument::stored_file(
            "https://example.com/docs",
            "https://example.com/files/week1.pdf",
            "courses/rust-101/week1.pdf",
            "rust-101",
            &["lectures".to_string()],
        );

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["s3_key"], "courses/rust-101/week1.pdf");
        assert_eq!(json["readable_filename"], "week1.pdf");
        assert_eq!(json["groups"].as_array().unwrap().len(), 1);
    }
}
