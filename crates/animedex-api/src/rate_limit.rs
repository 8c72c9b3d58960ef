//! Minimum spacing between outbound requests.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Gate that spaces request starts at least `min_interval` apart.
///
/// Each caller reserves the next free slot under the lock, then sleeps until
/// it. Concurrent callers therefore never fire inside the same interval, but
/// they are not guaranteed to go out in call order.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may be issued.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };

        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limiter delaying request");
            tokio::time::sleep_until(slot).await;
        }
    }
}
