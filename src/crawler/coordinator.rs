//! Crawl coordination
//!
//! The [`Coordinator`] owns one crawl run end to end: it seeds the frontier
//! (expanding a sitemap seed into its listed URLs), fans page visits out
//! across a worker pool held inside the governor's limits, and drains
//! outstanding dispatch work before reporting how many pages were visited.

use std::sync::Arc;

use reqwest::Client;
use tokio::task::JoinSet;
use url::Url;

use crate::config::{validate, Config, CrawlConfig, IngestionConfig};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::governor::{Governor, Permit};
use crate::crawler::processor::{self, PageVisitHook, ProcessError};
use crate::crawler::sitemap;
use crate::dispatch::{
    ContentSink, Dispatcher, HttpIngestSink, HttpMetadataStore, HttpObjectStore, IngestSink,
    MetadataStore, ObjectStore,
};
use crate::policy::{has_excluded_extension, normalize_url, UrlPolicy};
use crate::progress::ProgressSession;
use crate::render::{build_http_client, HttpRenderer, PageRenderer, RenderedPage};
use crate::Result;

/// Lifecycle of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Constructed but not started
    Idle,
    /// Resolving and enqueueing the seed URLs
    Seeding,
    /// Visiting pages from the frontier
    Running,
    /// Frontier exhausted; waiting on outstanding dispatch tasks
    Draining,
    /// Run finished; the visit count is final
    Done,
    /// Seeding or crawling hit an unrecoverable error
    Failed,
}

/// Collaborators a crawl run talks to
///
/// Production runs build these over HTTP with [`Services::over_http`]; tests
/// substitute fakes for any subset of them.
pub struct Services {
    /// Fetches pages and exposes their rendered content
    pub renderer: Arc<dyn PageRenderer>,
    /// Receives downloaded file bodies
    pub object_store: Arc<dyn ObjectStore>,
    /// Records stored files for later processing
    pub metadata_store: Arc<dyn MetadataStore>,
    /// Receives extracted page text and stored-file announcements
    pub ingest: Arc<dyn IngestSink>,
    /// Optional per-page extension point, awaited before each page is released
    pub on_visit_page: Option<Arc<dyn PageVisitHook>>,
}

impl Services {
    /// Builds the production service set over the configured HTTP endpoints
    pub fn over_http(crawl: &CrawlConfig, ingestion: &IngestionConfig) -> Result<Self> {
        let renderer = HttpRenderer::new(&crawl.cookies)?;
        let http = build_http_client()?;

        Ok(Self {
            renderer: Arc::new(renderer),
            object_store: Arc::new(HttpObjectStore::new(http.clone(), ingestion)),
            metadata_store: Arc::new(HttpMetadataStore::new(http.clone(), ingestion)),
            ingest: Arc::new(HttpIngestSink::new(http, ingestion)),
            on_visit_page: None,
        })
    }
}

/// Shared state a page-visit worker needs
struct CrawlContext {
    config: Arc<CrawlConfig>,
    frontier: Arc<Frontier>,
    policy: UrlPolicy,
    renderer: Arc<dyn PageRenderer>,
    hook: Option<Arc<dyn PageVisitHook>>,
    dispatcher: Dispatcher,
    progress: ProgressSession,
}

/// Drives one crawl run through its lifecycle
pub struct Coordinator {
    config: Arc<CrawlConfig>,
    client: Client,
    frontier: Arc<Frontier>,
    governor: Governor,
    dispatcher: Dispatcher,
    context: Arc<CrawlContext>,
    phase: CrawlPhase,
}

impl Coordinator {
    /// Creates a coordinator for the given configuration and services
    pub fn new(config: &Config, services: Services) -> Result<Self> {
        let crawl = Arc::new(config.crawl.clone());
        let policy = UrlPolicy::new(&crawl)?;
        let frontier = Arc::new(Frontier::new(crawl.max_pages_to_crawl));
        let governor = Governor::new(crawl.max_concurrency, crawl.max_requests_per_minute);
        let client = build_http_client()?;

        let dispatcher = Dispatcher::new(
            client.clone(),
            services.ingest,
            services.object_store,
            services.metadata_store,
            &crawl,
        );

        let context = Arc::new(CrawlContext {
            config: Arc::clone(&crawl),
            frontier: Arc::clone(&frontier),
            policy,
            renderer: services.renderer,
            hook: services.on_visit_page,
            dispatcher: dispatcher.clone(),
            progress: ProgressSession::begin(crawl.scrape_id.clone()),
        });

        Ok(Self {
            config: crawl,
            client,
            frontier,
            governor,
            dispatcher,
            context,
            phase: CrawlPhase::Idle,
        })
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    fn set_phase(&mut self, phase: CrawlPhase) {
        tracing::debug!("Crawl phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Drives the crawl to completion and returns the number of pages visited
    pub async fn run(&mut self) -> Result<u32> {
        let started = std::time::Instant::now();

        self.set_phase(CrawlPhase::Seeding);
        if let Err(e) = self.seed().await {
            self.set_phase(CrawlPhase::Failed);
            return Err(e);
        }

        self.set_phase(CrawlPhase::Running);
        let mut workers: JoinSet<()> = JoinSet::new();
        loop {
            match self.frontier.begin_visit() {
                Some(entry) => {
                    if has_excluded_extension(&entry.url, &self.config.resource_exclusions) {
                        tracing::debug!("Skipping excluded resource {}", entry.url);
                        self.frontier.abandon_visit();
                        continue;
                    }

                    let permit = self.governor.admit().await;
                    workers.spawn(visit_page(Arc::clone(&self.context), entry, permit));
                }
                None => {
                    // Nothing dispatchable right now. Running workers may
                    // still enqueue links; once the pool is empty the
                    // frontier can no longer grow.
                    if workers.join_next().await.is_none() {
                        break;
                    }
                }
            }
        }

        self.set_phase(CrawlPhase::Draining);
        let outstanding = self.dispatcher.outstanding();
        if outstanding > 0 {
            tracing::info!("Waiting for {} outstanding dispatch tasks", outstanding);
        }
        self.dispatcher.drain().await;

        self.set_phase(CrawlPhase::Done);
        tracing::info!(
            "Crawl completed: {} pages visited, {} failed, {} URLs discovered in {:.1}s",
            self.frontier.visited(),
            self.frontier.failed(),
            self.frontier.discovered(),
            started.elapsed().as_secs_f64()
        );

        Ok(self.frontier.visited())
    }

    /// Resolves the configured start URL into frontier entries
    ///
    /// A sitemap seed is expanded into the URLs it lists; anything else is
    /// enqueued directly. Seeds bypass the URL policy so a crawl can start
    /// from a hub page outside its own match patterns.
    async fn seed(&self) -> Result<()> {
        let seed = normalize_url(&self.config.url, None)?;

        let urls = if sitemap::is_sitemap_url(&seed) {
            tracing::info!("Expanding sitemap {}", seed);
            sitemap::fetch_sitemap_urls(&self.client, &seed).await?
        } else {
            vec![seed]
        };

        let mut enqueued = 0u32;
        for url in &urls {
            match normalize_url(url.as_str(), None) {
                Ok(normalized) => {
                    if self.frontier.enqueue(&normalized) {
                        enqueued += 1;
                    }
                }
                Err(e) => {
                    tracing::debug!("Skipping seed {}: {}", url, e);
                }
            }
        }

        tracing::info!("Seeded frontier with {} URLs", enqueued);
        Ok(())
    }
}

/// One worker's handling of one frontier entry
async fn visit_page(ctx: Arc<CrawlContext>, entry: FrontierEntry, _permit: Permit) {
    let url = entry.url;

    match run_visit(&ctx, &url).await {
        Ok(()) => {
            let visited = ctx.frontier.complete_visit();
            ctx.progress.record(u64::from(visited));
            tracing::info!(
                "Visited page {} of {}: {}",
                visited,
                ctx.config.max_pages_to_crawl,
                url
            );
        }
        Err(e) => {
            tracing::warn!("Failed to visit {}: {}", url, e);
            ctx.frontier.fail_visit();
        }
    }
}

/// Renders, processes, and dispatches one page
///
/// Link discovery happens only after processing succeeds: a page that could
/// not be processed contributes nothing to the frontier.
async fn run_visit(ctx: &CrawlContext, url: &Url) -> std::result::Result<(), ProcessError> {
    if processor::is_pdf_url(url) {
        // PDF bodies are binary; the offload path downloads them itself,
        // so there is nothing for the renderer to do.
        ctx.dispatcher.dispatch(&processor::pdf_result(url));
        return Ok(());
    }

    let page = ctx.renderer.render(url).await?;
    let sink = ContentSink::new(&ctx.dispatcher, page.final_url().clone());
    let result =
        processor::process(page.as_ref(), &ctx.config, ctx.hook.as_deref(), &sink).await?;

    enqueue_links(ctx, page.as_ref());
    ctx.dispatcher.dispatch(&result);

    Ok(())
}

/// Feeds a page's outbound links through the policy into the frontier
fn enqueue_links(ctx: &CrawlContext, page: &dyn RenderedPage) {
    let base = page.final_url();
    for link in page.links() {
        let normalized = match normalize_url(link.as_str(), Some(base)) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping link {}: {}", link, e);
                continue;
            }
        };

        if !ctx.policy.should_enqueue(&normalized) {
            continue;
        }

        if ctx.frontier.enqueue(&normalized) {
            tracing::debug!("Enqueued {}", normalized);
        }
    }
}

/// Runs a crawl with the production HTTP services
///
/// Returns the number of pages visited.
///
/// # Example
///
/// ```no_run
/// use gleaner::config::load_config;
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_config(Path::new("config.toml"))?;
///     let visited = gleaner::crawl(&config).await?;
///     println!("Visited {} pages", visited);
///     Ok(())
/// }
/// ```
pub async fn crawl(config: &Config) -> Result<u32> {
    let services = Services::over_http(&config.crawl, &config.ingestion)?;
    crawl_with(config, services).await
}

/// Runs a crawl against caller-supplied services
///
/// Validates the configuration first, so a bad config fails before any
/// network activity.
pub async fn crawl_with(config: &Config, services: Services) -> Result<u32> {
    validate(config)?;
    let mut coordinator = Coordinator::new(config, services)?;
    coordinator.run().await
}
