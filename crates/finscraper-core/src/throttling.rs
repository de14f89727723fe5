use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side request quota for a provider with a published rate limit.
///
/// `try_acquire` never blocks: when the budget is spent it returns the
/// interval after which one more request is allowed, and the caller reports
/// the source as rate limited so the resolver can move on.
#[derive(Clone)]
pub struct RequestBudget {
    limiter: Arc<DirectRateLimiter>,
    replenish_every: Duration,
}

impl RequestBudget {
    pub fn new(window: Duration, limit: u32) -> Self {
        let safe_limit = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
        let seconds_per_cell = (window.as_secs_f64() / f64::from(safe_limit.get())).max(0.001);
        let replenish_every = Duration::from_secs_f64(seconds_per_cell);

        let quota = Quota::with_period(replenish_every)
            .unwrap_or_else(|| Quota::per_second(safe_limit))
            .allow_burst(safe_limit);

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            replenish_every,
        }
    }

    /// Alpha Vantage free tier: five calls per minute.
    pub fn alphavantage_free_tier() -> Self {
        Self::new(Duration::from_secs(60), 5)
    }

    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.limiter.check().map_err(|_| self.replenish_every)
    }
}

impl std::fmt::Debug for RequestBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBudget")
            .field("replenish_every", &self.replenish_every)
            .finish()
    }
}
