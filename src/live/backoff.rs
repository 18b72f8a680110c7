//! Reconnect backoff policy
//!
//! Exponential delay with a cap and a bounded number of attempts.

use std::time::Duration;

use crate::config::LiveConfig;

/// Delay schedule for reconnecting a dropped event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first reconnect
    pub initial_delay: Duration,
    /// Growth factor applied per attempt
    pub multiplier: u32,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Reconnects allowed before giving up
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            multiplier: 2,
            max_delay: Duration::from_millis(30_000),
            max_attempts: 5,
        }
    }
}

impl BackoffPolicy {
    /// Delay for the given zero-based attempt, ignoring the budget.
    ///
    /// `min(initial_delay * multiplier^attempt, max_delay)`, saturating
    /// instead of overflowing for large attempts.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let initial = self.initial_delay.as_millis().min(u64::MAX as u128) as u64;
        let factor = (self.multiplier as u64).saturating_pow(attempt);
        let delay = Duration::from_millis(initial.saturating_mul(factor));
        delay.min(self.max_delay)
    }

    /// Delay for the next reconnect, or `None` once the budget is spent.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt < self.max_attempts {
            Some(self.delay_for(attempt))
        } else {
            None
        }
    }
}

impl From<&LiveConfig> for BackoffPolicy {
    fn from(config: &LiveConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_attempts: config.max_attempts,
        }
    }
}
