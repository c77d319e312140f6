//! Frontier: the pending/seen URL queue
//!
//! This module holds the breadth-first crawl frontier:
//! - A seen-set of normalized URL strings for O(1) duplicate rejection
//! - A FIFO queue of entries waiting for a worker
//! - The page-budget accounting that bounds the whole crawl
//!
//! All state sits behind one mutex so duplicate detection stays an atomic
//! check-and-insert across workers.

use chrono::{DateTime, Utc};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use url::Url;

/// A URL waiting to be visited
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    /// The URL to visit
    pub url: Url,

    /// When the URL entered the frontier
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<FrontierEntry>,
    seen: HashSet<String>,
    visited: u32,
    failed: u32,
    in_flight: u32,
}

impl FrontierInner {
    /// Pages handed to workers and not refunded: visited, failed, or running
    fn dispatched(&self) -> u32 {
        self.visited + self.failed + self.in_flight
    }
}

/// The crawl frontier: seen-set, FIFO queue, and page budget
///
/// The budget invariant: the number of dispatched pages (visited + failed +
/// in-flight) never exceeds `max_pages`. Once the budget is spent, `enqueue`
/// still records URLs in the seen-set but queues nothing, and `begin_visit`
/// stops handing out work; in-flight visits run to completion.
#[derive(Debug)]
pub struct Frontier {
    max_pages: u32,
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    /// Creates a frontier bounded by `max_pages` dispatched visits
    pub fn new(max_pages: u32) -> Self {
        Self {
            max_pages,
            inner: Mutex::new(FrontierInner::default()),
        }
    }

    /// Offers a normalized URL to the frontier
    ///
    /// Returns false for duplicates and for offers arriving after the budget
    /// is spent. In both cases the URL is remembered in the seen-set, so a
    /// rejected link can never be re-admitted later.
    pub fn enqueue(&self, url: &Url) -> bool {
        let mut inner = self.inner.lock().unwrap();

        if !inner.seen.insert(url.as_str().to_string()) {
            return false;
        }

        if inner.dispatched() >= self.max_pages {
            return false;
        }

        inner.queue.push_back(FrontierEntry {
            url: url.clone(),
            enqueued_at: Utc::now(),
        });
        true
    }

    /// Hands the oldest queued entry to a worker
    ///
    /// Returns None when the queue is empty or the budget is spent. The
    /// returned entry counts as in-flight until the worker settles it with
    /// `complete_visit`, `fail_visit`, or `abandon_visit`.
    pub fn begin_visit(&self) -> Option<FrontierEntry> {
        let mut inner = self.inner.lock().unwrap();

        if inner.dispatched() >= self.max_pages {
            return None;
        }

        let entry = inner.queue.pop_front()?;
        inner.in_flight += 1;
        Some(entry)
    }

    /// Settles an in-flight visit as successfully processed
    ///
    /// Returns the new visited count.
    pub fn complete_visit(&self) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.visited += 1;
        inner.visited
    }

    /// Settles an in-flight visit as failed; its budget slot stays consumed
    pub fn fail_visit(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.failed += 1;
    }

    /// Abandons an in-flight visit and refunds its budget slot
    ///
    /// Used when a fetch is aborted before rendering (resource-type
    /// exclusion); such pages must not count against the budget.
    pub fn abandon_visit(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }

    /// Number of entries waiting in the queue
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    /// Returns true when no entries wait in the queue
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().queue.is_empty()
    }

    /// Budget slots still available for dispatch
    pub fn remaining_budget(&self) -> u32 {
        let inner = self.inner.lock().unwrap();
        self.max_pages.saturating_sub(inner.dispatched())
    }

    /// Pages processed to completion
    pub fn visited(&self) -> u32 {
        self.inner.lock().unwrap().visited
    }

    /// Pages that were dispatched but failed
    pub fn failed(&self) -> u32 {
        self.inner.lock().unwrap().failed
    }

    /// Visits currently running
    pub fn in_flight(&self) -> u32 {
        self.inner.lock().unwrap().in_flight
    }

    /// Distinct URLs ever offered, accepted or not
    pub fn discovered(&self) -> usize {
        self.inner.lock().unwrap().seen.len()
    }
}
