//! Exponential-backoff schedule for event store writes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration with exponential backoff. The write is attempted
/// `max_retries + 1` times in total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first.
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each one after.
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    /// Policy for general event writes.
    pub fn general() -> Self {
        Self::new(3, 1000)
    }

    /// Lighter policy for impression tracking: a high-volume, low-value
    /// signal whose worst-case latency must stay bounded.
    pub fn impressions() -> Self {
        Self::new(2, 500)
    }

    /// Total attempts including the first.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry `attempt` (0-indexed): `base * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << attempt.min(20)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::general()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_retry() {
        let policy = RetryPolicy::general();

        assert_eq!(policy.total_attempts(), 4);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_impression_policy_is_lighter() {
        let policy = RetryPolicy::impressions();

        assert_eq!(policy.total_attempts(), 3);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1000));
    }
}
