use std::future::Future;
use std::time::Duration;

use crate::foundation::error::RedubResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Bounded exponential backoff for server-side failures.
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubled for every further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Run the operation exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(2)))
    }
}

/// Run `op`, retrying only while it fails with a transient (HTTP 5xx) transport error.
pub async fn retry_transient<T, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> RedubResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RedubResult<T>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                attempt += 1;
                let wait = policy.delay_before(attempt);
                tracing::warn!("{what} failed with a server error: {e}. Retrying in {wait:?}");
                tokio::time::sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/providers/retry.rs"]
mod tests;
