use crate::UrlError;
use url::Url;

/// Normalizes a URL into the frontier's identity form
///
/// # Normalization Steps
///
/// 1. Resolve `url_str` against `base` when one is given (relative links),
///    otherwise parse it as an absolute URL; reject if malformed
/// 2. Require an http or https scheme
/// 3. Require a host
/// 4. Remove the fragment (everything after #)
///
/// Lower-casing of scheme and host and dot-segment resolution happen as part
/// of parsing. The query string is kept: distinct queries are distinct pages.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
/// * `base` - The page the URL was discovered on, for relative references
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use gleaner::policy::normalize_url;
///
/// let url = normalize_url("HTTPS://EXAMPLE.COM/Docs#intro", None).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/Docs");
/// ```
pub fn normalize_url(url_str: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    // Step 1: Parse, resolving relative references against the base
    let mut url = match base {
        Some(base) => base
            .join(url_str)
            .map_err(|e| UrlError::Parse(e.to_string()))?,
        None => Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?,
    };

    // Step 2: Validate scheme (http allowed alongside https so crawls can
    // target plain-http sites and mock servers)
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Step 3: Require a host
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    // Step 4: Remove fragment
    url.set_fragment(None);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_lowercase_scheme_and_host() {
        let result = normalize_url("HTTPS://EXAMPLE.COM/Page", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_path_case_preserved() {
        let result = normalize_url("https://example.com/Docs/Intro", None).unwrap();
        assert_eq!(result.path(), "/Docs/Intro");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_query_kept() {
        let result = normalize_url("https://example.com/page?id=2", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?id=2");
    }

    #[test]
    fn test_relative_resolution() {
        let base = Url::parse("https://example.com/docs/intro").unwrap();
        let result = normalize_url("../guide/setup", Some(&base)).unwrap();
        assert_eq!(result.as_str(), "https://example.com/guide/setup");
    }

    #[test]
    fn test_relative_resolution_with_fragment() {
        let base = Url::parse("https://example.com/docs/").unwrap();
        let result = normalize_url("setup#install", Some(&base)).unwrap();
        assert_eq!(result.as_str(), "https://example.com/docs/setup");
    }

    #[test]
    fn test_absolute_link_ignores_base() {
        let base = Url::parse("https://example.com/docs/").unwrap();
        let result = normalize_url("https://other.example.org/a", Some(&base)).unwrap();
        assert_eq!(result.as_str(), "https://other.example.org/a");
    }

    #[test]
    fn test_dot_segments_resolved() {
        let result = normalize_url("https://example.com/a/../b/./c", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_idempotent() {
        let cases = [
            "https://example.com",
            "https://EXAMPLE.com/Docs/Page?b=2&a=1#frag",
            "http://example.com/a/../b",
            "https://example.com/page?id=7",
        ];

        for case in cases {
            let once = normalize_url(case, None).unwrap();
            let twice = normalize_url(once.as_str(), None).unwrap();
            assert_eq!(once, twice, "normalization not idempotent for {}", case);
        }
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page", None);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_mailto_rejected() {
        let result = normalize_url("mailto:someone@example.com", None);
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        let result = normalize_url("not a url", None);
        assert!(result.is_err());
    }
}
