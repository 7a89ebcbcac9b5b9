//! Retry policy.

use crate::backoff::calculate_delay;
use std::time::Duration;

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default base delay for exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Default upper bound on any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// How many times to attempt a call and how long to wait in between.
///
/// Immutable once built; a policy is shared by every call a client makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never below 1.
    pub max_attempts: u32,
    /// Delay before the second attempt, doubled for each one after.
    pub base_delay: Duration,
    /// Cap on any single delay, including server hints.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create the default policy (3 attempts, 1s base, 30s cap).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total number of attempts.
    #[must_use]
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    /// Set the base delay.
    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the delay cap.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new().max_attempts(1)
    }

    /// Effective attempt count.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after `attempt` failed, honoring a server hint if present.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        calculate_delay(
            attempt,
            self.base_delay,
            self.max_delay,
            retry_after,
            &mut rand::thread_rng(),
        )
    }
}
