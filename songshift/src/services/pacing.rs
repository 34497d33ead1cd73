//! Fixed inter-batch pacing delay
//!
//! Every external batch call (search or grouped insert) is followed by the
//! same fixed wait to stay under provider quotas. No backoff, no jitter.

use std::time::Duration;
use tracing::debug;

/// Default delay between external batch calls
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(1000);

/// Fixed-delay pacer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Pacer that never waits (tests, dry runs against fakes)
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the pacing interval
    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        debug!(delay_ms = self.delay.as_millis() as u64, "Pacing before next batch");
        tokio::time::sleep(self.delay).await;
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_PACING_DELAY)
    }
}
