use crate::config::types::{Config, Cookie, CrawlConfig, IngestionConfig, ScrapeStrategy};
use crate::policy::compile_patterns;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_ingestion_config(&config.ingestion)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.url.trim().is_empty() {
        return Err(ConfigError::Validation("url cannot be empty".to_string()));
    }

    let seed = Url::parse(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url '{}': {}", config.url, e)))?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "url must use http or https, got '{}'",
            seed.scheme()
        )));
    }

    if config.scrape_strategy == ScrapeStrategy::EqualAndBelow && config.match_patterns.is_empty()
    {
        return Err(ConfigError::Validation(
            "scrape-strategy 'equal-and-below' requires at least one match pattern".to_string(),
        ));
    }

    if config.max_pages_to_crawl < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages-to-crawl must be >= 1, got {}",
            config.max_pages_to_crawl
        )));
    }

    if config.max_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "max-concurrency must be >= 1, got {}",
            config.max_concurrency
        )));
    }

    if config.max_requests_per_minute < 1 {
        return Err(ConfigError::Validation(format!(
            "max-requests-per-minute must be >= 1, got {}",
            config.max_requests_per_minute
        )));
    }

    if config.course_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "course-name cannot be empty".to_string(),
        ));
    }

    if let Some(selector) = &config.selector {
        if selector.trim().is_empty() {
            return Err(ConfigError::Validation(
                "selector cannot be empty when set".to_string(),
            ));
        }
    }

    if let Some(max_file_size) = config.max_file_size {
        if max_file_size < 1 {
            return Err(ConfigError::Validation(format!(
                "max-file-size must be >= 1 when set, got {}",
                max_file_size
            )));
        }
    }

    if let Some(max_tokens) = config.max_tokens {
        if max_tokens < 1 {
            return Err(ConfigError::Validation(format!(
                "max-tokens must be >= 1 when set, got {}",
                max_tokens
            )));
        }
    }

    validate_resource_exclusions(&config.resource_exclusions)?;
    validate_cookies(&config.cookies)?;

    // Compile-check the glob patterns so bad ones fail before any fetch
    compile_patterns(&config.match_patterns)?;
    compile_patterns(&config.exclude)?;

    Ok(())
}

/// Validates the resource-exclusion extension list
fn validate_resource_exclusions(extensions: &[String]) -> Result<(), ConfigError> {
    for extension in extensions {
        if extension.is_empty() {
            return Err(ConfigError::Validation(
                "resource-exclusions entries cannot be empty".to_string(),
            ));
        }

        if !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(format!(
                "resource-exclusions entries must be bare extensions like 'png', got '{}'",
                extension
            )));
        }
    }
    Ok(())
}

/// Validates configured cookies
fn validate_cookies(cookies: &[Cookie]) -> Result<(), ConfigError> {
    for cookie in cookies {
        if cookie.name.is_empty() {
            return Err(ConfigError::Validation(
                "cookie name cannot be empty".to_string(),
            ));
        }

        // Header injection guard: cookie values travel in a request header
        if cookie.name.contains(['\r', '\n', ';', '=']) || cookie.value.contains(['\r', '\n']) {
            return Err(ConfigError::Validation(format!(
                "cookie '{}' contains characters not allowed in a Cookie header",
                cookie.name
            )));
        }
    }
    Ok(())
}

/// Validates ingestion endpoint configuration
fn validate_ingestion_config(config: &IngestionConfig) -> Result<(), ConfigError> {
    for (field, value) in [
        ("ingest-url", &config.ingest_url),
        ("metadata-url", &config.metadata_url),
        ("storage-url", &config.storage_url),
    ] {
        Url::parse(value)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;
    }

    if config.storage_bucket.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage-bucket cannot be empty".to_string(),
        ));
    }

    Ok(())
}
