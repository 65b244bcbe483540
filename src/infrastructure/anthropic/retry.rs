/// Retry policy with exponential backoff for Messages API requests
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use super::error::ModelApiError;

/// Retry policy with exponential backoff
///
/// Backoff doubles with each retry, capped at `max_backoff_ms`.
///
/// # Retry decision
/// - Retry on: rate limits, 5xx, overload, timeouts, network errors
/// - Do NOT retry: auth failures, invalid requests, serialization errors
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries before giving up
    pub max_retries: u32,

    /// Initial backoff duration in milliseconds
    pub initial_backoff_ms: u64,

    /// Maximum backoff duration in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 15_000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or exhausts the
    /// retry budget.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ModelApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ModelApiError>>,
    {
        let mut backoff_ms = self.initial_backoff_ms;
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(%error, attempt, backoff_ms, "transient model API error, retrying");
                    sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(self.max_backoff_ms);
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let policy = RetryPolicy::new(3, 1, 4);
        let calls = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ModelApiError::Overloaded)
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let policy = RetryPolicy::new(3, 1, 4);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ModelApiError::AuthenticationFailed("nope".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_returns_last_error() {
        let policy = RetryPolicy::new(2, 1, 4);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ModelApiError::Timeout) }
            })
            .await;

        assert!(matches!(result, Err(ModelApiError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 3); // initial + 2 retries
    }
}
