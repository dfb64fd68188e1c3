use serde_json::Value;
use std::time::Duration;

use super::{Endpoint, Fetch, FetchError};

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; 1 disables retries
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Single attempt
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before the attempt following `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Retries retryable failures of the wrapped fetcher according to a policy.
pub struct Retrying<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F> Retrying<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: Fetch> Fetch for Retrying<F> {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, FetchError> {
        let mut attempt = 1;
        loop {
            match self.inner.fetch(endpoint).await {
                Ok(payload) => return Ok(payload),
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        endpoint = %endpoint,
                        attempt,
                        error = %e,
                        "retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
