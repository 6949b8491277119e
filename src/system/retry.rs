//! Fixed-delay bounded retry policy for agent invocations.
//! Holds no timer itself; the executor decides how to wait.

use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// A policy of zero attempts is clamped to one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Attempt numbers, 1-based.
    pub fn attempts(&self) -> impl Iterator<Item = u32> {
        1..=self.max_attempts
    }

    /// Delay to wait after failed attempt `attempt`, or `None` if it was the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then_some(self.delay)
    }

    /// Longest total time spent waiting between attempts.
    pub fn worst_case_wait(&self) -> Duration {
        self.delay * (self.max_attempts - 1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}
