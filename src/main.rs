//! Gleaner main entry point
//!
//! This is the command-line interface for the Gleaner course-content crawler.

use clap::Parser;
use gleaner::config::load_config_with_hash;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gleaner: a course-content crawl engine
///
/// Gleaner walks a course site (or a sitemap) within configured URL
/// boundaries, extracts readable page text, and submits each page or PDF
/// to a downstream ingestion service.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version = "1.0.0")]
#[command(about = "A course-content crawl engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &gleaner::Config) {
    println!("=== Gleaner Dry Run ===\n");

    println!("Crawl Configuration:");
    println!("  Start URL: {}", config.crawl.url);
    println!("  Course name: {}", config.crawl.course_name);
    println!("  Strategy: {:?}", config.crawl.scrape_strategy);
    println!("  Max pages: {}", config.crawl.max_pages_to_crawl);
    println!("  Max concurrency: {}", config.crawl.max_concurrency);
    println!(
        "  Max requests per minute: {}",
        config.crawl.max_requests_per_minute
    );

    if !config.crawl.match_patterns.is_empty() {
        println!("\nMatch Patterns ({}):", config.crawl.match_patterns.len());
        for pattern in &config.crawl.match_patterns {
            println!("  - {}", pattern);
        }
    }

    println!("\nExclude Patterns ({}):", config.crawl.exclude.len());
    for pattern in &config.crawl.exclude {
        println!("  - {}", pattern);
    }

    if let Some(selector) = &config.crawl.selector {
        println!("\nContent Selector:");
        println!("  {}", selector);
        println!(
            "  Wait timeout: {}ms",
            config.crawl.wait_for_selector_timeout
        );
    }

    println!("\nIngestion Endpoints:");
    println!("  Ingest: {}", config.ingestion.ingest_url);
    println!("  Metadata: {}", config.ingestion.metadata_url);
    println!(
        "  Storage: {} (bucket: {})",
        config.ingestion.storage_url, config.ingestion.storage_bucket
    );

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling from {}", config.crawl.url);
}

/// Handles the main crawl operation
async fn handle_crawl(config: &gleaner::Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting crawl of {} for course '{}'",
        config.crawl.url,
        config.crawl.course_name
    );

    match gleaner::crawl(config).await {
        Ok(visited) => {
            tracing::info!("Crawl completed successfully");
            println!("Visited {} pages", visited);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
