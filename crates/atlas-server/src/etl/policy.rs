//! Retry and timeout policies
//!
//! Explicit policy objects composed around units of work, instead of ad hoc
//! wrapping at each call site. The loader pairs a [`RetryPolicy`] with a
//! [`TimeoutPolicy`] per statement class (truncate, parent insert, child
//! insert).

use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{error, warn};

use super::LoadError;

/// Base delay for exponential backoff; doubles per retry, no jitter
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(100);

/// Retries transient failures with exponential backoff
///
/// `max_retries` counts re-attempts after the first try, so a policy with
/// `max_retries = 3` invokes the operation at most 4 times. Non-retryable
/// errors (see [`LoadError::is_retryable`]) fail immediately; exhausting
/// the budget re-raises the last error.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_backoff: DEFAULT_BASE_BACKOFF,
        }
    }

    #[cfg(test)]
    fn with_backoff(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
        }
    }

    /// Delay before the given retry (1-indexed): base * 2^(retry - 1)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(retry.saturating_sub(1))
    }

    /// Run `op` against `ctx`, re-attempting transient failures
    ///
    /// The operation borrows the context mutably for each attempt, which
    /// lets callers retry statements against a live connection or open
    /// transaction.
    pub async fn run<Ctx, T, F>(
        &self,
        operation: &str,
        ctx: &mut Ctx,
        mut op: F,
    ) -> Result<T, LoadError>
    where
        F: for<'c> FnMut(&'c mut Ctx) -> BoxFuture<'c, Result<T, LoadError>>,
    {
        let mut retries = 0u32;

        loop {
            match op(ctx).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if retries >= self.max_retries || !err.is_retryable() {
                        error!(
                            operation,
                            attempts = retries + 1,
                            error = %err,
                            "Operation failed"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    let delay = self.backoff(retries);
                    warn!(
                        operation,
                        retry = retries,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying operation"
                    );
                    sleep(delay).await;
                },
            }
        }
    }
}

/// Bounds an operation's wall-clock time
///
/// When the timer fires first the caller gets [`LoadError::Timeout`] and
/// moves on; the underlying statement may still be running server-side, so
/// a timeout means "outcome unknown" and the surrounding transaction is
/// rolled back.
#[derive(Debug, Clone)]
pub struct TimeoutPolicy {
    duration: Duration,
}

impl TimeoutPolicy {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub async fn run<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T, LoadError>>,
    ) -> Result<T, LoadError> {
        match timeout(self.duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(LoadError::Timeout {
                operation: operation.to_string(),
                timeout_ms: self.duration.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn retryable() -> LoadError {
        LoadError::Timeout {
            operation: "test".to_string(),
            timeout_ms: 1,
        }
    }

    fn non_retryable() -> LoadError {
        LoadError::Database(sqlx::Error::RowNotFound)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(3);
        let mut attempts = 0u32;

        let result = policy
            .run("flaky", &mut attempts, |attempts| {
                async move {
                    *attempts += 1;
                    if *attempts < 3 {
                        Err(retryable())
                    } else {
                        Ok(*attempts)
                    }
                }
                .boxed()
            })
            .await;

        // Failed twice, succeeded on the third invocation
        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_on_first_invocation() {
        let policy = RetryPolicy::new(3);
        let mut attempts = 0u32;

        let result: Result<(), _> = policy
            .run("fatal", &mut attempts, |attempts| {
                async move {
                    *attempts += 1;
                    Err(non_retryable())
                }
                .boxed()
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_reraise_last_error() {
        let policy = RetryPolicy::new(2);
        let mut attempts = 0u32;

        let result: Result<(), _> = policy
            .run("always-failing", &mut attempts, |attempts| {
                async move {
                    *attempts += 1;
                    Err(retryable())
                }
                .boxed()
            })
            .await;

        // First try plus two retries
        assert_eq!(attempts, 3);
        assert!(matches!(result, Err(LoadError::Timeout { .. })));
    }

    #[test]
    fn test_backoff_doubles_per_retry() {
        let policy = RetryPolicy::with_backoff(5, Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_policy_aborts_slow_operation() {
        let policy = TimeoutPolicy::new(Duration::from_millis(50));

        let result: Result<(), _> = policy
            .run("slow", async {
                sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        match result {
            Err(LoadError::Timeout {
                operation,
                timeout_ms,
            }) => {
                assert_eq!(operation, "slow");
                assert_eq!(timeout_ms, 50);
            },
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_policy_passes_through_fast_operation() {
        let policy = TimeoutPolicy::new(Duration::from_secs(1));

        let result = policy.run("fast", async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
