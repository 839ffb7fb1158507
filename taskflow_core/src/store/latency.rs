use std::time::Duration;

use rand::Rng as _;

/// Simulated network round-trip applied before every store operation. Each
/// wait is sampled uniformly from the configured range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    min_ms: u64,
    max_ms: u64,
}

impl Latency {
    /// The round-trip range of a plausible remote backend.
    pub const fn simulated() -> Self {
        Latency { min_ms: 100, max_ms: 400 }
    }

    /// No waiting at all.
    pub const fn none() -> Self {
        Latency { min_ms: 0, max_ms: 0 }
    }

    /// A fixed wait of exactly `ms` milliseconds.
    pub const fn fixed(ms: u64) -> Self {
        Latency { min_ms: ms, max_ms: ms }
    }

    fn sample(&self) -> Duration {
        let ms = if self.min_ms == self.max_ms {
            self.min_ms
        } else {
            rand::thread_rng().gen_range(self.min_ms..=self.max_ms)
        };
        Duration::from_millis(ms)
    }

    /// Waits out one sampled round-trip. Once started the wait cannot be
    /// cancelled or shortened; callers block until it elapses.
    pub(crate) async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Latency::simulated()
    }
}
