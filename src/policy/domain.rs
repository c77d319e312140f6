use url::Url;

/// Second-level labels commonly reserved under two-letter country TLDs
/// ("co.uk", "com.au", "ac.jp", ...)
const COUNTRY_SECOND_LEVELS: &[&str] = &["ac", "co", "com", "edu", "gov", "mil", "net", "org"];

/// Extracts the hostname from a URL
///
/// # Arguments
///
/// * `url` - The URL to extract the hostname from
///
/// # Returns
///
/// * `Some(String)` - The lowercase hostname
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use gleaner::policy::hostname;
///
/// let url = Url::parse("https://sub.example.com/path").unwrap();
/// assert_eq!(hostname(&url), Some("sub.example.com".to_string()));
/// ```
pub fn hostname(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Derives the registrable domain of a hostname
///
/// Hosts sharing a registrable domain belong to the same site for the
/// `same-domain` strategy: `blog.example.com` and `example.com` both map to
/// `example.com`.
///
/// The derivation takes the last two labels, or the last three when the TLD
/// is a two-letter country code whose second level is a common reserved label
/// (`co.uk`, `com.au`, ...). IP addresses are returned whole.
///
/// # Examples
///
/// ```
/// use gleaner::policy::registrable_domain;
///
/// assert_eq!(registrable_domain("blog.example.com"), "example.com");
/// assert_eq!(registrable_domain("www.example.co.uk"), "example.co.uk");
/// assert_eq!(registrable_domain("example.com"), "example.com");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host.to_lowercase();

    if host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let tld = labels[labels.len() - 1];
    let second = labels[labels.len() - 2];

    let keep = if tld.len() == 2 && COUNTRY_SECOND_LEVELS.contains(&second) && labels.len() >= 3 {
        3
    } else {
        2
    };

    labels[labels.len() - keep..].join(".")
}
