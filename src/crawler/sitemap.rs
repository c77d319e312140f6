//! Sitemap seeding
//!
//! A seed URL that names a sitemap file is expanded into the URLs it lists
//! before the crawl starts. Sitemap indexes are followed one level deep: a
//! `<loc>` pointing at another sitemap contributes that sitemap's entries,
//! but sitemaps nested further are ignored.

use crate::{GleanerError, Result};
use reqwest::Client;
use url::Url;

/// True when the URL names a sitemap file
pub fn is_sitemap_url(url: &Url) -> bool {
    let raw = url.as_str();
    raw.contains("sitemap") && raw.ends_with(".xml")
}

/// Fetches a sitemap and returns its page URLs in document order
pub async fn fetch_sitemap_urls(client: &Client, sitemap_url: &Url) -> Result<Vec<Url>> {
    let entries = fetch_locs(client, sitemap_url).await?;

    let mut urls = Vec::new();
    for entry in entries {
        if is_sitemap_url(&entry) {
            // Sitemap index entry: pull in the child sitemap's pages
            match fetch_locs(client, &entry).await {
                Ok(nested) => {
                    urls.extend(nested.into_iter().filter(|url| !is_sitemap_url(url)));
                }
                Err(e) => {
                    tracing::warn!("Skipping child sitemap {}: {}", entry, e);
                }
            }
        } else {
            urls.push(entry);
        }
    }

    Ok(urls)
}

async fn fetch_locs(client: &Client, url: &Url) -> Result<Vec<Url>> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(GleanerError::Sitemap {
            url: url.to_string(),
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    let body = response.text().await?;
    Ok(extract_loc_values(&body))
}

/// Pulls every `<loc>` value out of sitemap XML
///
/// The sitemap schema puts a bare URL inside each `<loc>` with no
/// attributes or nested markup, so a string scan is sufficient.
fn extract_loc_values(xml: &str) -> Vec<Url> {
    let mut values = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find("<loc>") {
        rest = &rest[start + "<loc>".len()..];
        let end = match rest.find("</loc>") {
            Some(end) => end,
            None => break,
        };
        if let Ok(url) = Url::parse(rest[..end].trim()) {
            values.push(url);
        }
        rest = &rest[end + "</loc>".len()..];
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_detects_sitemap_urls() {
        assert!(is_sitemap_url(&url("https://example.com/sitemap.xml")));
        assert!(is_sitemap_url(&url("https://example.com/sitemap-courses.xml")));
        assert!(is_sitemap_url(&url("https://example.com/files/sitemap_index.xml")));
    }

    #[test]
    fn test_rejects_non_sitemap_urls() {
        assert!(!is_sitemap_url(&url("https://example.com/docs")));
        assert!(!is_sitemap_url(&url("https://example.com/feed.xml")));
        assert!(!is_sitemap_url(&url("https://example.com/sitemap.html")));
        assert!(!is_sitemap_url(&url("https://example.com/sitemap.xml?page=2")));
    }

    #[test]
    fn test_extracts_locs_in_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://example.com/docs/a</loc><lastmod>2024-01-01</lastmod></url>
              <url><loc> https://example.com/docs/b </loc></url>
            </urlset>"#;

        let values = extract_loc_values(xml);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].as_str(), "https://example.com/docs/a");
        assert_eq!(values[1].as_str(), "https://example.com/docs/b");
    }

    #[test]
    fn test_skips_unparseable_locs() {
        let xml = "<urlset><url><loc>not a url</loc></url>\
                   <url><loc>https://example.com/ok</loc></url></urlset>";

        let values = extract_loc_values(xml);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].as_str(), "https://example.com/ok");
    }

    #[test]
    fn test_unterminated_loc_stops_cleanly() {
        let xml = "<urlset><url><loc>https://example.com/a</loc></url><url><loc>https://example.com/b";
        let values = extract_loc_values(xml);
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_empty_document() {
        assert!(extract_loc_values("").is_empty());
        assert!(extract_loc_values("<urlset></urlset>").is_empty());
    }
}
