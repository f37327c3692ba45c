//! Attempt bound and pacing for the reconciliation loop.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{MAX_RECONCILE_ATTEMPTS, RECONCILE_RETRY_DELAY};

/// Fixed-delay retry policy: at most `max_attempts` attempts, `delay`
/// between two consecutive ones, no delay after the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(with = "crate::config::duration_ms")]
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RECONCILE_ATTEMPTS,
            delay: RECONCILE_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Attempts actually made. A zero bound still performs one attempt.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Whether attempt number `attempt` (1-based) may be followed by another.
    pub fn allows_another(&self, attempt: u32) -> bool {
        attempt < self.attempts()
    }

    /// Total time spent sleeping when every attempt fails.
    pub fn worst_case_delay(&self) -> Duration {
        self.delay.saturating_mul(self.attempts() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 30);
        assert_eq!(policy.worst_case_delay(), Duration::from_secs(29));
    }

    #[test]
    fn test_allows_another() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        assert!(policy.allows_another(1));
        assert!(policy.allows_another(2));
        assert!(!policy.allows_another(3));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.attempts(), 1);
        assert!(!policy.allows_another(1));
        assert_eq!(policy.worst_case_delay(), Duration::ZERO);
    }

    #[test]
    fn test_serde_uses_millis() {
        let json = serde_json::to_value(RetryPolicy::default()).unwrap();
        assert_eq!(json["max_attempts"], 30);
        assert_eq!(json["delay"], 1_000);
        let back: RetryPolicy = serde_json::from_value(json).unwrap();
        assert_eq!(back, RetryPolicy::default());
    }
}
