//! Bounded retries for remote calls
//!
//! Every remote read and write goes through [`RetryExecutor::run`]. The policy
//! is a fixed number of attempts with a fixed pause between them. Reads and
//! writes are treated alike: a write that failed after the remote applied it
//! will be sent again.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempt budget and pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    #[inline]
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(10))
    }
}

/// Runs fallible async operations under a [`RetryPolicy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    #[inline]
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` until it succeeds or the attempt budget is spent
    ///
    /// Each failure is logged before the pause. The sleep blocks the caller;
    /// there is no cancellation short of dropping the future.
    ///
    /// # Errors
    /// Returns the error of the final attempt unchanged.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation = label, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) if attempt >= max_attempts => {
                    tracing::error!(operation = label, attempt, %error, "giving up");
                    return Err(error);
                }
                Err(error) => {
                    tracing::warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        %error,
                        delay_secs = self.policy.delay.as_secs_f64(),
                        "remote call failed, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let executor = RetryExecutor::default();
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<u32, String> = executor
            .run("read", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(format!("failure {n}"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_error_when_exhausted() {
        let executor = RetryExecutor::new(RetryPolicy::new(3, Duration::from_secs(10)));
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = executor
            .run("write", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("failure {n}")) }
            })
            .await;

        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_success_does_not_sleep() {
        let executor = RetryExecutor::new(RetryPolicy::new(5, Duration::from_secs(3600)));
        let result: Result<&str, String> = executor.run("read", || async { Ok("ok") }).await;
        assert_eq!(result, Ok("ok"));
    }

    #[test]
    fn zero_attempts_clamps_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
        assert_eq!(RetryPolicy::default().max_attempts, 5);
        assert_eq!(RetryPolicy::default().delay, Duration::from_secs(10));
    }
}
