//! Shared retry utilities for API requests.
//!
//! Every request to the Sleeper API goes through [`with_retry`], so rate-limit
//! discipline is identical across all resource routines.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::sync::{
    INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_FETCH_RETRIES, ProgressCallback, SyncProgress,
};

/// Configuration for retry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_FETCH_RETRIES as usize,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Execute an operation, retrying errors accepted by `is_retryable`.
///
/// Returns the successful value, or the last error once retries are exhausted
/// (or immediately for errors that are not retryable), paired with the number
/// of attempts made.
///
/// # Example
///
/// ```ignore
/// use sleeper_sync::retry::{RetryConfig, with_retry};
///
/// let (result, attempts) = with_retry(
///     || async { send_once(path).await },
///     RetryConfig::default(),
///     |e: &AttemptError| e.is_retryable(),
///     |e: &AttemptError| e.to_string(),
///     "/state/nfl",
///     None,
/// ).await;
/// ```
pub async fn with_retry<T, E, F, Fut, IsRetryable, ShortMsg>(
    mut operation: F,
    config: RetryConfig,
    is_retryable: IsRetryable,
    short_message: ShortMsg,
    path: &str,
    on_progress: Option<&ProgressCallback>,
) -> (Result<T, E>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    IsRetryable: Fn(&E) -> bool,
    ShortMsg: Fn(&E) -> String,
{
    let attempt = AtomicU32::new(0);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    let result = retry_op
        .retry(config.into_backoff())
        .notify(|err, dur| {
            let current_attempt = attempt.load(Ordering::SeqCst);
            if let Some(cb) = on_progress {
                cb(SyncProgress::RateLimitBackoff {
                    path: path.to_string(),
                    retry_after_ms: dur.as_millis() as u64,
                    attempt: current_attempt,
                });
            }
            tracing::warn!(
                path,
                attempt = current_attempt,
                delay = ?dur,
                "Request failed, retrying: {}",
                short_message(err)
            );
        })
        .when(|e| is_retryable(e))
        .await;

    (result, attempt.load(Ordering::SeqCst))
}
