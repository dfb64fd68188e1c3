use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval pacing for one endpoint class.
///
/// Shared by every worker of a run; holding the lock across the sleep keeps
/// concurrent callers in a queue, so the interval holds regardless of worker
/// count.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the interval since the previous dispatch has passed, then
    /// record a dispatch now.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Time of the last recorded dispatch, if any
    pub async fn last_dispatch(&self) -> Option<Instant> {
        *self.last_request.lock().await
    }
}
