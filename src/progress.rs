//! Process-wide crawl progress, keyed by session id
//!
//! A crawl invoked with a `scrape-id` publishes its visited-page count here
//! so an external poller can read it while the crawl runs. Entries live
//! exactly as long as their crawl: [`ProgressSession`] registers the id
//! when the crawl starts and removes it when dropped.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

fn store() -> &'static Mutex<HashMap<String, u64>> {
    static STORE: OnceLock<Mutex<HashMap<String, u64>>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Visited-page count for a session; 0 when unknown or already finished
pub fn progress_for(scrape_id: &str) -> u64 {
    store().lock().unwrap().get(scrape_id).copied().unwrap_or(0)
}

/// Publishes progress for the lifetime of one crawl
#[derive(Debug)]
pub struct ProgressSession {
    scrape_id: Option<String>,
}

impl ProgressSession {
    /// Registers the id with a zero count; None makes every update a no-op
    pub fn begin(scrape_id: Option<String>) -> Self {
        if let Some(id) = &scrape_id {
            store().lock().unwrap().insert(id.clone(), 0);
        }
        Self { scrape_id }
    }

    /// Raises the published count to `visited`
    ///
    /// Workers report concurrently and out of order; the published count
    /// only ever moves up.
    pub fn record(&self, visited: u64) {
        if let Some(id) = &self.scrape_id {
            let mut entries = store().lock().unwrap();
            let entry = entries.entry(id.clone()).or_insert(0);
            if visited > *entry {
                *entry = visited;
            }
        }
    }
}

impl Drop for ProgressSession {
    fn drop(&mut self) {
        if let Some(id) = &self.scrape_id {
            store().lock().unwrap().remove(id);
        }
    }
}
