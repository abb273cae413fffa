//! Retry logic with exponential backoff
//!
//! Used by the transport for connection-level failures only: a request is
//! re-sent when it provably never reached the server.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Options for retry behavior
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry manager for executing operations with exponential backoff
///
/// # Examples
///
/// ```no_run
/// use portal_publisher::core::{RetryManager, RetryOptions};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let manager = RetryManager::new(RetryOptions::default());
///
///     let result = manager
///         .retry_if(|| async { Ok::<_, std::io::Error>("success") }, |_| true)
///         .await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RetryManager {
    options: RetryOptions,
}

impl RetryManager {
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Execute the given async operation, retrying while `should_retry` accepts the error
    ///
    /// The last error is returned once `max_attempts` is exhausted or a
    /// non-retryable error is seen.
    pub async fn retry_if<F, Fut, T, E, P>(&self, mut operation: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut delay = self.options.initial_delay;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if attempt >= self.options.max_attempts || !should_retry(&error) {
                        return Err(error);
                    }

                    tracing::debug!(attempt, ?delay, "retrying after connection failure");
                    sleep(delay).await;

                    delay = Duration::from_secs_f64(
                        delay.as_secs_f64() * self.options.backoff_multiplier,
                    )
                    .min(self.options.max_delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn is_refused(error: &Error) -> bool {
        error.kind() == ErrorKind::ConnectionRefused
    }

    fn fast_options(max_attempts: u32) -> RetryOptions {
        RetryOptions {
            max_attempts,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_success_on_first_attempt() {
        let manager = RetryManager::new(RetryOptions::default());

        let result = manager
            .retry_if(|| async { Ok::<_, Error>(42) }, is_refused)
            .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let manager = RetryManager::new(fast_options(3));

        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry_if(
                move || {
                    let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if count < 2 {
                            Err(Error::from(ErrorKind::ConnectionRefused))
                        } else {
                            Ok("success")
                        }
                    }
                },
                is_refused,
            )
            .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_max_attempts_reached() {
        let manager = RetryManager::new(fast_options(3));

        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry_if(
                move || {
                    counter_clone.fetch_add(1, Ordering::SeqCst);
                    async move { Err::<i32, _>(Error::from(ErrorKind::ConnectionRefused)) }
                },
                is_refused,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error() {
        let manager = RetryManager::new(RetryOptions::default());

        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry_if(
                move || {
                    counter_clone.fetch_add(1, Ordering::SeqCst);
                    async move { Err::<i32, _>(Error::from(ErrorKind::InvalidData)) }
                },
                is_refused,
            )
            .await;

        assert!(result.is_err());
        // Should fail immediately without retries
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_backoff_with_max_delay_cap() {
        let manager = RetryManager::new(RetryOptions {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(200),
            backoff_multiplier: 3.0,
        });

        let start = tokio::time::Instant::now();

        let _result = manager
            .retry_if(
                || async { Err::<i32, _>(Error::from(ErrorKind::ConnectionRefused)) },
                is_refused,
            )
            .await;

        // Delays: 100, 200 (capped), 200, 200; the last attempt doesn't wait
        assert_eq!(start.elapsed(), Duration::from_millis(700));
    }

    #[test]
    fn test_retry_options_default() {
        let options = RetryOptions::default();

        assert_eq!(options.max_attempts, 3);
        assert_eq!(options.initial_delay, Duration::from_millis(500));
        assert_eq!(options.max_delay, Duration::from_secs(10));
        assert_eq!(options.backoff_multiplier, 2.0);
    }
}
