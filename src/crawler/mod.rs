//! Crawl engine: frontier, governor, page processing, and coordination
//!
//! This module contains the core crawling logic, including:
//! - The frontier queue with duplicate detection and the page budget
//! - Rate and concurrency admission control
//! - Per-page processing from rendered content to a dispatchable result
//! - Sitemap seed expansion
//! - Overall crawl coordination

mod coordinator;
pub mod frontier;
pub mod governor;
pub mod processor;
pub mod sitemap;

pub use coordinator::{crawl, crawl_with, Coordinator, CrawlPhase, Services};
pub use frontier::{Frontier, FrontierEntry};
pub use governor::Governor;
pub use processor::{ContentPush, PageKind, PageResult, PageVisitHook, ProcessError};
