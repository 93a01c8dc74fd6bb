//! Rate limiting implementation
//!
//! Uses the governor crate for GCRA rate limiting. The external API grants
//! `max_calls` per `window`; the limiter hands out one permit per period so
//! that dispatch never exceeds that ceiling over any rolling window.

use crate::error::{Error, Result};
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for rate limiting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum number of calls the API accepts per window
    pub max_calls: u32,
    /// Length of the rolling window
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        // Catalog API ceiling
        Self {
            max_calls: 1999,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(max_calls: u32, window: Duration) -> Self {
        Self { max_calls, window }
    }

    /// Create config allowing `max_calls` per second
    pub fn per_second(max_calls: u32) -> Self {
        Self::new(max_calls, Duration::from_secs(1))
    }

    /// Interval between permits when the budget is split across `slots`
    ///
    /// `window / (max_calls / slots)`, i.e. each slot gets an equal share
    /// of the global budget.
    pub fn period_for_slots(&self, slots: usize) -> Result<Duration> {
        if self.max_calls == 0 {
            return Err(Error::invalid_value(
                "pagination.max_calls",
                "must be greater than zero",
            ));
        }
        if self.window.is_zero() {
            return Err(Error::invalid_value(
                "pagination.window_seconds",
                "must be greater than zero",
            ));
        }

        let slots = u32::try_from(slots.max(1))
            .map_err(|_| Error::invalid_value("pagination.slots", "too many slots"))?;
        let scaled = self
            .window
            .checked_mul(slots)
            .ok_or_else(|| Error::invalid_value("pagination.window_seconds", "window too large"))?;

        Ok(scaled / self.max_calls)
    }
}

/// GCRA rate limiter with a burst of one
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
    period: Duration,
}

impl RateLimiter {
    /// Create a rate limiter for a dispatcher driving `slots` concurrent slots
    pub fn new(config: &RateLimiterConfig, slots: usize) -> Result<Self> {
        let period = config.period_for_slots(slots)?;
        Self::with_period(period)
    }

    /// Create a rate limiter handing out one permit per `period`
    pub fn with_period(period: Duration) -> Result<Self> {
        let quota = Quota::with_period(period)
            .ok_or_else(|| Error::invalid_value("rate_limit", "period must be non-zero"))?
            .allow_burst(NonZeroU32::MIN);

        Ok(Self {
            limiter: Arc::new(Governor::direct(quota)),
            period,
        })
    }

    /// Interval between two permits
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("period", &self.period)
            .finish()
    }
}
