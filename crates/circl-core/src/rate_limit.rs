use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Time-gate limiter: consecutive calls are spaced at least `min_interval`
/// apart. A call arriving early waits out the remainder instead of failing.
///
/// Each [`SecureClient`](crate::secure::SecureClient) owns its own limiter,
/// so separate clients never throttle each other.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next call is allowed, then record it.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                tracing::debug!(
                    wait_ms = (ready_at - now).as_millis() as u64,
                    "rate limiter delaying call"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Forget the last call so the next one proceeds immediately.
    pub async fn reset(&self) {
        *self.last_call.lock().await = None;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_millis(500)
    }
}
