//! Exponential backoff for transient search engine failures.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use job_index_repository::SearchError;

/// Retry settings for search engine writes.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_retry_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_retry_delay_ms: 100,
            max_retry_delay_ms: 5000,
        }
    }
}

impl RetryPolicy {
    /// Fail on the first error.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Run `operation`, retrying transient errors with exponential backoff.
///
/// Non-transient errors are returned immediately.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, SearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SearchError>>,
{
    let mut delay_ms = policy.initial_retry_delay_ms;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(attempt = attempt, operation = label, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if !e.is_transient() => {
                debug!(error = %e, operation = label, "Non-retryable error encountered");
                return Err(e);
            }
            Err(e) if attempt >= policy.max_retries => {
                warn!(
                    attempts = attempt + 1,
                    error = %e,
                    operation = label,
                    "Giving up after retries"
                );
                return Err(e);
            }
            Err(e) => {
                attempt += 1;
                warn!(
                    attempt = attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay_ms,
                    error = %e,
                    operation = label,
                    "Operation failed, retrying"
                );

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = std::cmp::min(delay_ms.saturating_mul(2), policy.max_retry_delay_ms);
            }
        }
    }
}
