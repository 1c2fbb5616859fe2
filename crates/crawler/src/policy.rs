use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Populate errors tolerated before a crawl with the error budget enabled
/// gives up. Fixed; the budget can only be switched off.
pub const POPULATE_ERROR_THRESHOLD: u64 = 5;

/// How a crawl proceeds and when it stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlPolicy {
    /// First id to request; ids start at 1.
    pub start_id: u64,
    /// Upper bound (exclusive) of the random pause between requests.
    pub jitter: Duration,
    /// Stop after this many requests, whatever else happens.
    pub max_requests: Option<u64>,
    /// Stop once populate errors exceed [`POPULATE_ERROR_THRESHOLD`].
    pub error_budget: bool,
}
impl Default for CrawlPolicy {
    fn default() -> Self {
        Self { start_id: 1, jitter: Duration::from_secs(5), max_requests: None, error_budget: true }
    }
}

/// Uniformly random delays in `[0, bound)`.
#[derive(Debug, Clone)]
pub(crate) struct Jitter {
    bound: Duration,
    rng: StdRng,
}
impl Jitter {
    pub fn new(bound: Duration) -> Self {
        Self { bound, rng: StdRng::from_entropy() }
    }

    pub fn seeded(bound: Duration, seed: u64) -> Self {
        Self { bound, rng: StdRng::seed_from_u64(seed) }
    }

    pub fn next_delay(&mut self) -> Duration {
        if self.bound.is_zero() {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.rng.gen_range(0.0..self.bound.as_secs_f64()))
    }
}
