//! Governor: concurrency and request-rate admission
//!
//! Every fetch passes through `Governor::admit` before touching the network.
//! Admission enforces two independent ceilings:
//! - At most `max_concurrency` fetches in flight, via a semaphore whose
//!   permit rides inside the returned [`Permit`]
//! - At most `per_minute` admissions inside any sliding sixty-second
//!   window, tracked as admission timestamps
//!
//! A worker that cannot be admitted waits; admission is never an error.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep, Duration, Instant};

const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Proof of admission for one fetch
///
/// Holds the concurrency slot; dropping the permit releases it. The rate
/// token has no release, it simply ages out of the sliding window.
#[derive(Debug)]
pub struct Permit {
    _concurrency: OwnedSemaphorePermit,
}

/// Admission control for outbound fetches
#[derive(Debug)]
pub struct Governor {
    concurrency: Arc<Semaphore>,
    per_minute: u32,
    window: Mutex<VecDeque<Instant>>,
}

impl Governor {
    pub fn new(max_concurrency: u32, per_minute: u32) -> Self {
        Self {
            concurrency: Arc::new(Semaphore::new(max_concurrency as usize)),
            per_minute,
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Waits until both ceilings allow another fetch
    ///
    /// The concurrency slot is taken first so a worker blocked on the rate
    /// window is already counted against concurrency and cannot stampede
    /// when the window opens.
    pub async fn admit(&self) -> Permit {
        let permit = self
            .concurrency
            .clone()
            .acquire_owned()
            .await
            .expect("concurrency semaphore is never closed");

        self.wait_for_rate_slot().await;

        Permit {
            _concurrency: permit,
        }
    }

    /// Blocks until the sliding window has room, then records the admission
    async fn wait_for_rate_slot(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().unwrap();

                while window
                    .front()
                    .is_some_and(|stamp| stamp.elapsed() >= RATE_WINDOW)
                {
                    window.pop_front();
                }

                if (window.len() as u32) < self.per_minute {
                    window.push_back(Instant::now());
                    None
                } else {
                    // Sleep until the oldest admission ages out
                    window
                        .front()
                        .map(|oldest| RATE_WINDOW.saturating_sub(oldest.elapsed()))
                }
            };

            match wait {
                None => return,
                Some(duration) => sleep(duration.max(Duration::from_millis(1))).await,
            }
        }
    }
}
