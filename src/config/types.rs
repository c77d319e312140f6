use serde::{Deserialize, Deserializer};

/// Main configuration structure for Gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub ingestion: IngestionConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed URL, or a sitemap URL to expand into seeds
    pub url: String,

    /// Glob patterns a link must match under the `equal-and-below` strategy
    #[serde(default, rename = "match", deserialize_with = "one_or_many")]
    pub match_patterns: Vec<String>,

    /// Glob patterns that always reject a link, whatever the strategy
    #[serde(default = "default_exclude", deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,

    /// Link-inclusion strategy
    #[serde(rename = "scrape-strategy")]
    pub scrape_strategy: ScrapeStrategy,

    /// Hard cap on pages handed to workers
    #[serde(rename = "max-pages-to-crawl")]
    pub max_pages_to_crawl: u32,

    /// Maximum number of simultaneously in-flight page visits
    #[serde(rename = "max-concurrency", default = "default_max_concurrency")]
    pub max_concurrency: u32,

    /// Maximum page visits admitted per rolling 60-second window
    #[serde(
        rename = "max-requests-per-minute",
        default = "default_max_requests_per_minute"
    )]
    pub max_requests_per_minute: u32,

    /// Course identifier scoping storage keys and ingestion records
    #[serde(rename = "course-name")]
    pub course_name: String,

    /// Content selector: CSS, or XPath when it starts with '/'
    #[serde(default)]
    pub selector: Option<String>,

    /// How long to wait for the selector to appear (milliseconds)
    #[serde(
        rename = "wait-for-selector-timeout",
        default = "default_wait_for_selector_timeout"
    )]
    pub wait_for_selector_timeout: u64,

    /// File extensions whose fetches are aborted before rendering
    #[serde(rename = "resource-exclusions", default)]
    pub resource_exclusions: Vec<String>,

    /// Advisory size limit; recorded with the crawl, not enforced
    #[serde(rename = "max-file-size", default)]
    pub max_file_size: Option<u32>,

    /// Advisory token limit; recorded with the crawl, not enforced
    #[serde(rename = "max-tokens", default)]
    pub max_tokens: Option<u32>,

    /// Group tags forwarded with every ingestion record
    #[serde(rename = "document-groups", default)]
    pub document_groups: Vec<String>,

    /// Cookies attached to every page render
    #[serde(default, rename = "cookie", deserialize_with = "one_or_many_cookies")]
    pub cookies: Vec<Cookie>,

    /// Session identifier under which progress is published for polling
    #[serde(rename = "scrape-id", default)]
    pub scrape_id: Option<String>,
}

/// Link-inclusion strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrapeStrategy {
    /// Any valid absolute http(s) URL
    All,
    /// Same registrable domain as the seed, subdomains included
    SameDomain,
    /// Exact hostname match with the seed
    SameHostname,
    /// Same hostname, path at or below the seed path, and a `match` glob hit
    EqualAndBelow,
}

/// A cookie injected into every page render
#[derive(Debug, Clone, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Downstream ingestion endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Ingestion webhook receiving page content and storage keys
    #[serde(rename = "ingest-url")]
    pub ingest_url: String,

    /// Metadata store receiving pending-document rows
    #[serde(rename = "metadata-url")]
    pub metadata_url: String,

    /// Object storage base URL
    #[serde(rename = "storage-url")]
    pub storage_url: String,

    /// Bucket under which files are stored
    #[serde(rename = "storage-bucket")]
    pub storage_bucket: String,

    /// Basic-auth token sent to the webhook and metadata store
    #[serde(rename = "auth-token", default)]
    pub auth_token: Option<String>,
}

/// Domains the crawler never follows links into unless overridden
fn default_exclude() -> Vec<String> {
    vec![
        "https://www.facebook.com/**".to_string(),
        "https://youtube.com/**".to_string(),
        "https://linkedin.com/**".to_string(),
        "https://instagram.com/**".to_string(),
    ]
}

fn default_max_concurrency() -> u32 {
    20
}

fn default_max_requests_per_minute() -> u32 {
    120
}

fn default_wait_for_selector_timeout() -> u64 {
    1000
}

/// Accepts either a single string or a list of strings
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Accepts either a single cookie table or a list of them
fn one_or_many_cookies<'de, D>(deserializer: D) -> Result<Vec<Cookie>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Cookie),
        Many(Vec<Cookie>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(cookie) => vec![cookie],
        OneOrMany::Many(cookies) => cookies,
    })
}
