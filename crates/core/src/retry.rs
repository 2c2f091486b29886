//! Bounded retries for transient upstream failures.

use std::fmt::Display;
use std::future::Future;

use tracing::warn;

use crate::config::RetryConfig;
use crate::llm::LlmError;
use crate::metrics;
use crate::search::SearchError;

/// Errors that can tell whether a retry may help.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for LlmError {
    fn is_transient(&self) -> bool {
        LlmError::is_transient(self)
    }
}

impl Transient for SearchError {
    fn is_transient(&self) -> bool {
        SearchError::is_transient(self)
    }
}

/// Run `op`, retrying transient failures up to `policy.max_attempts` extra times.
pub async fn retry_transient<T, E, F, Fut>(
    policy: &RetryConfig,
    operation: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Transient + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                metrics::RETRY_ATTEMPTS
                    .with_label_values(&[operation])
                    .inc();
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = fast_policy(3);
        let result: Result<u32, SearchError> = retry_transient(&policy, "test", || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(SearchError::Timeout)
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = fast_policy(2);
        let result: Result<(), SearchError> = retry_transient(&policy, "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SearchError::Timeout)
        })
        .await;

        assert!(matches!(result, Err(SearchError::Timeout)));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = fast_policy(5);
        let result: Result<(), LlmError> = retry_transient(&policy, "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Api {
                status: 401,
                message: "bad key".to_string(),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
