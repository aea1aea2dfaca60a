use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Sleeper's documented ceiling: 1000 calls per minute, program-wide.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 1000;

/// A proactive API rate limiter using the governor crate.
///
/// Clones share the same underlying bucket, so every routine holding a clone
/// of the client draws from one budget.
///
/// # Example
///
/// ```ignore
/// use sleeper_sync::api::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::per_minute(1000);
///
/// // Before each API call:
/// limiter.wait().await;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a limiter allowing `requests_per_minute` requests each minute.
    ///
    /// A value of 0 is treated as 1.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let rpm = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            inner: Arc::new(RateLimiter::direct(Quota::per_minute(rpm))),
        }
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }

    /// Claim a slot without waiting. Returns `false` when the budget is spent.
    #[cfg(test)]
    pub fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_minute_allows_initial_burst_up_to_quota() {
        let limiter = ApiRateLimiter::per_minute(3);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn zero_quota_falls_back_to_one() {
        let limiter = ApiRateLimiter::per_minute(0);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn clones_share_one_budget() {
        let limiter = ApiRateLimiter::per_minute(1);
        let clone = limiter.clone();
        assert!(limiter.try_acquire());
        assert!(!clone.try_acquire());
    }

    #[tokio::test]
    async fn wait_returns_immediately_with_budget() {
        let limiter = ApiRateLimiter::per_minute(DEFAULT_REQUESTS_PER_MINUTE);
        tokio::time::timeout(std::time::Duration::from_secs(1), limiter.wait())
            .await
            .expect("wait should not block with budget available");
    }
}
