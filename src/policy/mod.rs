//! URL policy module for Gleaner
//!
//! This module decides which discovered links a crawl may follow: strategy
//! classification, include/exclude glob matching, URL normalization, and the
//! fetch-time resource-type filter.

mod domain;
mod normalize;
mod patterns;

use crate::config::{CrawlConfig, ScrapeStrategy};
use crate::ConfigError;
use url::Url;

// Re-export main functions
pub use domain::{hostname, registrable_domain};
pub use normalize::normalize_url;
pub use patterns::{compile_patterns, UrlPatterns};

/// Compiled link-admission policy for one crawl
///
/// Built once from the configuration, then consulted for every discovered
/// link. Seeds are enqueued directly and never pass through here.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    strategy: ScrapeStrategy,
    include: UrlPatterns,
    exclude: UrlPatterns,
    seed_hostname: String,
    seed_domain: String,
    seed_path: String,
}

impl UrlPolicy {
    /// Compiles the policy from a crawl configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    ///
    /// # Returns
    ///
    /// * `Ok(UrlPolicy)` - Compiled policy
    /// * `Err(ConfigError)` - Seed URL or a glob pattern is invalid
    pub fn new(config: &CrawlConfig) -> Result<Self, ConfigError> {
        let seed = normalize_url(&config.url, None)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url '{}': {}", config.url, e)))?;

        let seed_hostname = hostname(&seed).ok_or_else(|| {
            ConfigError::InvalidUrl(format!("url '{}' has no hostname", config.url))
        })?;

        Ok(Self {
            strategy: config.scrape_strategy,
            include: compile_patterns(&config.match_patterns)?,
            exclude: compile_patterns(&config.exclude)?,
            seed_domain: registrable_domain(&seed_hostname),
            seed_path: seed.path().to_string(),
            seed_hostname,
        })
    }

    /// Decides whether a discovered link may enter the frontier
    ///
    /// The candidate must pass the strategy check first; any `exclude` hit
    /// then rejects it regardless, so a broad strategy can never escape into
    /// a denylisted domain.
    ///
    /// # Arguments
    ///
    /// * `candidate` - A normalized candidate URL
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gleaner::policy::UrlPolicy;
    /// use url::Url;
    ///
    /// # fn example(policy: &UrlPolicy) {
    /// let link = Url::parse("https://example.com/docs/setup").unwrap();
    /// if policy.should_enqueue(&link) {
    ///     println!("following {}", link);
    /// }
    /// # }
    /// ```
    pub fn should_enqueue(&self, candidate: &Url) -> bool {
        if candidate.scheme() != "http" && candidate.scheme() != "https" {
            return false;
        }

        let accepted = match self.strategy {
            ScrapeStrategy::All => true,
            ScrapeStrategy::SameDomain => match hostname(candidate) {
                Some(host) => registrable_domain(&host) == self.seed_domain,
                None => false,
            },
            ScrapeStrategy::SameHostname => match hostname(candidate) {
                Some(host) => host == self.seed_hostname,
                None => false,
            },
            ScrapeStrategy::EqualAndBelow => match hostname(candidate) {
                Some(host) => {
                    host == self.seed_hostname
                        && path_at_or_below(candidate.path(), &self.seed_path)
                        && self.include.matches(candidate)
                }
                None => false,
            },
        };

        accepted && !self.exclude.matches(candidate)
    }
}

/// Returns true when `candidate` equals the seed path or descends from it
/// along whole path segments
fn path_at_or_below(candidate: &str, seed: &str) -> bool {
    let seed = seed.trim_end_matches('/');
    if seed.is_empty() {
        // Seed at the site root: every path is below it
        return true;
    }

    match candidate.strip_prefix(seed) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Extracts the lowercase file extension from a URL's path, if any
pub fn path_extension(url: &Url) -> Option<String> {
    let last_segment = url.path_segments()?.last()?;
    let (_, extension) = last_segment.rsplit_once('.')?;

    if extension.is_empty() {
        None
    } else {
        Some(extension.to_ascii_lowercase())
    }
}

/// Returns true if the URL's path extension is on the fetch-time block list
///
/// This filter runs before rendering; a blocked fetch does not count against
/// the page budget.
pub fn has_excluded_extension(url: &Url, exclusions: &[String]) -> bool {
    match path_extension(url) {
        Some(extension) => exclusions
            .iter()
            .any(|blocked| blocked.eq_ignore_ascii_case(&extension)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(strategy: ScrapeStrategy, seed: &str) -> CrawlConfig {
        CrawlConfig {
            url: seed.to_string(),
            match_patterns: vec![],
            exclude: vec![],
            scrape_strategy: strategy,
            max_pages_to_crawl: 10,
            max_concurrency: 4,
            max_requests_per_minute: 60,
            course_name: "cs101".to_string(),
            selector: None,
            wait_for_selector_timeout: 1000,
            resource_exclusions: vec![],
            max_file_size: None,
            max_tokens: None,
            document_groups: vec![],
            cookies: vec![],
            scrape_id: None,
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_all_accepts_any_host() {
        let policy = UrlPolicy::new(&test_config(ScrapeStrategy::All, "https://example.com"))
            .unwrap();

        assert!(policy.should_enqueue(&url("https://example.com/a")));
        assert!(policy.should_enqueue(&url("https://elsewhere.org/b")));
    }

    #[test]
    fn test_all_rejects_non_http_schemes() {
        let policy = UrlPolicy::new(&test_config(ScrapeStrategy::All, "https://example.com"))
            .unwrap();

        assert!(!policy.should_enqueue(&url("ftp://example.com/file")));
    }

    #[test]
    fn test_same_hostname_requires_exact_host() {
        let policy = UrlPolicy::new(&test_config(
            ScrapeStrategy::SameHostname,
            "https://docs.example.com/start",
        ))
        .unwrap();

        // Path never matters for this strategy
        assert!(policy.should_enqueue(&url("https://docs.example.com/anything/else")));
        assert!(!policy.should_enqueue(&url("https://example.com/anything")));
        assert!(!policy.should_enqueue(&url("https://blog.example.com/post")));
    }

    #[test]
    fn test_same_domain_includes_subdomains() {
        let policy = UrlPolicy::new(&test_config(
            ScrapeStrategy::SameDomain,
            "https://www.example.com",
        ))
        .unwrap();

        assert!(policy.should_enqueue(&url("https://www.example.com/a")));
        assert!(policy.should_enqueue(&url("https://example.com/b")));
        assert!(policy.should_enqueue(&url("https://docs.example.com/c")));
        assert!(!policy.should_enqueue(&url("https://example.org/d")));
        assert!(!policy.should_enqueue(&url("https://notexample.com/e")));
    }

    #[test]
    fn test_equal_and_below_conjunction() {
        let mut config = test_config(ScrapeStrategy::EqualAndBelow, "https://example.com/docs");
        config.match_patterns = vec!["https://example.com/docs/**".to_string()];
        let policy = UrlPolicy::new(&config).unwrap();

        // Hostname + path descent + glob must all hold
        assert!(policy.should_enqueue(&url("https://example.com/docs/a")));
        assert!(policy.should_enqueue(&url("https://example.com/docs/a/b")));
        assert!(!policy.should_enqueue(&url("https://example.com/other")));
        assert!(!policy.should_enqueue(&url("https://example.com/docsify/a")));
        assert!(!policy.should_enqueue(&url("https://other.com/docs/a")));
    }

    #[test]
    fn test_equal_and_below_scenario() {
        // Seed https://example.com/docs, match https://example.com/docs/**:
        // of {/docs/a, /docs/b, /other, /docs/a} exactly /docs/a and /docs/b pass
        let mut config = test_config(ScrapeStrategy::EqualAndBelow, "https://example.com/docs");
        config.match_patterns = vec!["https://example.com/docs/**".to_string()];
        let policy = UrlPolicy::new(&config).unwrap();

        let discovered = [
            "https://example.com/docs/a",
            "https://example.com/docs/b",
            "https://example.com/other",
            "https://example.com/docs/a",
        ];
        let accepted: Vec<&str> = discovered
            .into_iter()
            .filter(|u| policy.should_enqueue(&url(u)))
            .collect();

        assert_eq!(
            accepted,
            vec![
                "https://example.com/docs/a",
                "https://example.com/docs/b",
                "https://example.com/docs/a",
            ]
        );
    }

    #[test]
    fn test_exclude_wins_over_strategy() {
        let mut config = test_config(ScrapeStrategy::SameHostname, "https://example.com");
        config.exclude = vec!["https://example.com/private/**".to_string()];
        let policy = UrlPolicy::new(&config).unwrap();

        assert!(policy.should_enqueue(&url("https://example.com/public/page")));
        assert!(!policy.should_enqueue(&url("https://example.com/private/page")));
    }

    #[test]
    fn test_exclude_wins_under_all() {
        let mut config = test_config(ScrapeStrategy::All, "https://example.com");
        config.exclude = vec!["https://www.facebook.com/**".to_string()];
        let policy = UrlPolicy::new(&config).unwrap();

        assert!(policy.should_enqueue(&url("https://anywhere.org/fine")));
        assert!(!policy.should_enqueue(&url("https://www.facebook.com/some/profile")));
    }

    #[test]
    fn test_path_at_or_below() {
        assert!(path_at_or_below("/docs", "/docs"));
        assert!(path_at_or_below("/docs/", "/docs"));
        assert!(path_at_or_below("/docs/a/b", "/docs"));
        assert!(path_at_or_below("/docs/a", "/docs/"));
        assert!(path_at_or_below("/anything", "/"));

        assert!(!path_at_or_below("/docsify", "/docs"));
        assert!(!path_at_or_below("/other", "/docs"));
        assert!(!path_at_or_below("/", "/docs"));
    }

    #[test]
    fn test_path_extension() {
        assert_eq!(
            path_extension(&url("https://example.com/file.PDF")),
            Some("pdf".to_string())
        );
        assert_eq!(
            path_extension(&url("https://example.com/a/image.png?v=2")),
            Some("png".to_string())
        );
        assert_eq!(path_extension(&url("https://example.com/no-extension")), None);
        assert_eq!(path_extension(&url("https://example.com/")), None);
        assert_eq!(path_extension(&url("https://example.com/trailing.")), None);
    }

    #[test]
    fn test_has_excluded_extension() {
        let exclusions = vec!["png".to_string(), "jpg".to_string()];

        assert!(has_excluded_extension(
            &url("https://example.com/logo.png"),
            &exclusions
        ));
        assert!(has_excluded_extension(
            &url("https://example.com/photo.JPG"),
            &exclusions
        ));
        assert!(!has_excluded_extension(
            &url("https://example.com/page.html"),
            &exclusions
        ));
        assert!(!has_excluded_extension(
            &url("https://example.com/page"),
            &exclusions
        ));
    }
}
