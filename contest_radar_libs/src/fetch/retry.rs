//! Bounded retry with exponential backoff around a single network call.
//! Rate-limit signals get a fixed cooldown instead of the usual backoff.

use crate::cancel::CancelToken;
use crate::fetch::FetchError;
use std::future::Future;
use std::time::Duration;
use tokio::time;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            rate_limit_cooldown: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, rate_limit_cooldown: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            rate_limit_cooldown,
        }
    }

    /// Runs `op` until it succeeds or the attempt budget is spent. The last
    /// error is returned on exhaustion; the caller decides whether that is
    /// fatal (for ingestion it never is).
    pub async fn run<T, F, Fut>(&self, cancel: &CancelToken, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(error) if attempt >= self.max_attempts => {
                    tracing::warn!(attempt, %error, "retry budget exhausted");
                    return Err(error);
                }
                Err(FetchError::RateLimited) => {
                    // Fixed cooldown regardless of attempt count.
                    tracing::warn!(
                        attempt,
                        cooldown_secs = self.rate_limit_cooldown.as_secs(),
                        "rate limited, cooling down before next attempt"
                    );
                    time::sleep(self.rate_limit_cooldown).await;
                }
                Err(error) => {
                    let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(
                        attempt,
                        delay_millis = delay.as_millis() as u64,
                        %error,
                        "attempt failed, backing off"
                    );
                    time::sleep(delay).await;
                }
            }
            attempt += 1;
        }
    }
}
