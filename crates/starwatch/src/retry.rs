//! Shared retry utilities for remote operations.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

/// Initial backoff delay.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Maximum retry attempts for a single remote call.
const MAX_RETRIES: usize = 5;

/// Build the default exponential backoff strategy for remote operations:
/// 1s initial delay, 60s cap, 5 attempts, jitter enabled.
#[must_use]
pub fn default_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(INITIAL_BACKOFF)
        .with_max_delay(MAX_BACKOFF)
        .with_max_times(MAX_RETRIES)
        .with_jitter()
}

/// Execute an operation, retrying with exponential backoff while
/// `is_retryable` classifies the error as transient (e.g. a rate limit
/// response). Non-retryable errors propagate immediately.
pub async fn with_retry<T, E, F, Fut, P>(operation: F, is_retryable: P, context: &str) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    operation
        .retry(default_backoff())
        .notify(|err: &E, dur: Duration| {
            tracing::debug!(context, delay = ?dur, error = %err, "retrying remote call");
        })
        .when(is_retryable)
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (retryable: {})", self.retryable)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);

        let result = with_retry(
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(TestError { retryable: true })
                } else {
                    Ok(42u32)
                }
            },
            |e: &TestError| e.retryable,
            "test",
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError { retryable: false })
            },
            |e: &TestError| e.retryable,
            "test",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
