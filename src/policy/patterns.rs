use crate::ConfigError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use url::Url;

/// A compiled set of URL glob patterns
///
/// Patterns match against the full normalized URL string. `*` stops at `/`
/// boundaries while `**` crosses any number of path segments, so
/// `https://example.com/docs/*` covers direct children of `/docs/` and
/// `https://example.com/docs/**` covers the whole subtree.
#[derive(Debug, Clone)]
pub struct UrlPatterns {
    set: GlobSet,
    is_empty: bool,
}

impl UrlPatterns {
    /// Returns true if any pattern in the set matches the URL
    pub fn matches(&self, url: &Url) -> bool {
        self.set.is_match(url.as_str())
    }

    /// Returns true if the set was compiled from no patterns
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }
}

/// Compiles glob patterns into a matchable set
///
/// # Arguments
///
/// * `patterns` - Glob patterns over full URL strings
///
/// # Returns
///
/// * `Ok(UrlPatterns)` - Compiled set
/// * `Err(ConfigError)` - A pattern failed to compile
///
/// # Examples
///
/// ```
/// use url::Url;
/// use gleaner::policy::compile_patterns;
///
/// let patterns = compile_patterns(&["https://example.com/docs/**".to_string()]).unwrap();
/// let url = Url::parse("https://example.com/docs/intro/setup").unwrap();
/// assert!(patterns.matches(&url));
/// ```
pub fn compile_patterns(patterns: &[String]) -> Result<UrlPatterns, ConfigError> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }

    let set = builder.build().map_err(|e| ConfigError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })?;

    Ok(UrlPatterns {
        set,
        is_empty: patterns.is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_double_star_crosses_segments() {
        let patterns = compile_patterns(&["https://example.com/docs/**".to_string()]).unwrap();

        assert!(patterns.matches(&url("https://example.com/docs/a")));
        assert!(patterns.matches(&url("https://example.com/docs/a/b/c")));
        assert!(!patterns.matches(&url("https://example.com/other")));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let patterns = compile_patterns(&["https://example.com/docs/*".to_string()]).unwrap();

        assert!(patterns.matches(&url("https://example.com/docs/a")));
        assert!(!patterns.matches(&url("https://example.com/docs/a/b")));
    }

    #[test]
    fn test_host_wildcard_domain() {
        let patterns = compile_patterns(&["https://www.facebook.com/**".to_string()]).unwrap();

        assert!(patterns.matches(&url("https://www.facebook.com/some/page")));
        assert!(!patterns.matches(&url("https://example.com/page")));
    }

    #[test]
    fn test_any_of_several_patterns() {
        let patterns = compile_patterns(&[
            "https://example.com/a/**".to_string(),
            "https://example.com/b/**".to_string(),
        ])
        .unwrap();

        assert!(patterns.matches(&url("https://example.com/a/x")));
        assert!(patterns.matches(&url("https://example.com/b/y")));
        assert!(!patterns.matches(&url("https://example.com/c/z")));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let patterns = compile_patterns(&[]).unwrap();

        assert!(patterns.is_empty());
        assert!(!patterns.matches(&url("https://example.com/")));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = compile_patterns(&["https://example.com/[".to_string()]);
        assert!(result.is_err());
    }
}
