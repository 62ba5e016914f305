//! Retry bounds and exponential backoff.
//!
//! The delay before retry `attempt` (0-based) is
//! `base_delay * backoff_multiplier^attempt`, so a fully exhausted sequence
//! waits `base_delay * Σ multiplier^i` for `i` in `[0, max_retries)`.

use std::time::Duration;

use crate::config::RecoveryConfig;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Configuration for retry behavior with exponential backoff.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries for one logical operation.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth factor applied per attempt. Values below 1.0 are raised to 1.0.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
        }
    }
}

impl From<&RecoveryConfig> for RetryPolicy {
    fn from(config: &RecoveryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.base_delay_ms),
            config.backoff_multiplier,
        )
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with the specified parameters.
    ///
    /// Multipliers below 1.0 (and NaN) are raised to 1.0, which gives a
    /// constant delay. Policies loaded through [`RecoveryConfig`] always grow,
    /// since validation requires a multiplier above 1.0 and a non-zero base.
    pub fn new(max_retries: u32, base_delay: Duration, backoff_multiplier: f64) -> Self {
        let backoff_multiplier = if backoff_multiplier.is_finite() {
            backoff_multiplier.max(1.0)
        } else {
            1.0
        };
        Self {
            max_retries,
            base_delay,
            backoff_multiplier,
        }
    }

    /// Calculates the delay before retrying after `attempt` previous retries.
    ///
    /// Computed at nanosecond resolution. Saturates at `Duration::MAX` instead
    /// of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let nanos = self.base_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);
        if !nanos.is_finite() {
            return Duration::MAX;
        }
        let secs = (nanos / NANOS_PER_SEC).floor();
        if secs >= u64::MAX as f64 {
            return Duration::MAX;
        }
        let subsec_nanos = (nanos - secs * NANOS_PER_SEC).round() as u32;
        Duration::new(secs as u64, subsec_nanos)
    }

    /// Returns true while another retry is allowed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Every delay of a fully exhausted retry sequence, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|a| self.delay_for(a)).collect()
    }

    /// Worst-case total time spent sleeping across all retries.
    pub fn worst_case_total(&self) -> Duration {
        self.schedule()
            .into_iter()
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_delay_exponential_growth() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), 2.0);

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(4), Duration::from_millis(1600));
    }

    #[test]
    fn test_delays_strictly_increasing() {
        let policy = RetryPolicy::new(6, Duration::from_millis(50), 1.5);
        let schedule = policy.schedule();
        assert_eq!(schedule.len(), 6);
        for pair in schedule.windows(2) {
            assert!(pair[0] < pair[1], "{:?}", pair);
        }
    }

    #[test]
    fn test_sub_millisecond_delays_are_exact() {
        let config = RecoveryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            backoff_multiplier: 1.5,
            ..RecoveryConfig::default()
        };
        let schedule = RetryPolicy::from(&config).schedule();
        assert_eq!(
            schedule,
            vec![
                Duration::from_micros(1000),
                Duration::from_micros(1500),
                Duration::from_micros(2250),
            ]
        );
        for pair in schedule.windows(2) {
            assert!(pair[0] < pair[1], "{:?}", pair);
        }
    }

    #[test]
    fn test_saturating_millis() {
        assert_eq!(saturating_millis(Duration::from_micros(2250)), 2);
        assert_eq!(saturating_millis(Duration::from_secs(7)), 7000);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);

        let policy = RetryPolicy::new(64, Duration::from_secs(1), 2.0);
        assert_eq!(saturating_millis(policy.worst_case_total()), u64::MAX);
    }

    #[test]
    fn test_multiplier_below_one_is_clamped() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), 0.5);
        assert_eq!(policy.backoff_multiplier, 1.0);
        let policy = RetryPolicy::new(3, Duration::from_millis(10), f64::NAN);
        assert_eq!(policy.backoff_multiplier, 1.0);
    }

    #[test]
    fn test_should_retry_respects_max() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), 2.0);
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(4));

        let never = RetryPolicy::new(0, Duration::from_millis(10), 2.0);
        assert!(!never.should_retry(0));
        assert!(never.schedule().is_empty());
    }

    #[test]
    fn test_worst_case_total() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000), 2.0);
        // 1000 + 2000 + 4000
        assert_eq!(policy.worst_case_total(), Duration::from_millis(7000));
    }

    #[test]
    fn test_delay_handles_overflow() {
        let policy = RetryPolicy::new(u32::MAX, Duration::from_secs(1), 10.0);
        assert_eq!(policy.delay_for(10_000), Duration::MAX);
        assert_eq!(policy.delay_for(u32::MAX), Duration::MAX);
    }

    #[test]
    fn test_from_config() {
        let config = RecoveryConfig {
            max_retries: 5,
            base_delay_ms: 250,
            backoff_multiplier: 3.0,
            ..RecoveryConfig::default()
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.delay_for(2), Duration::from_millis(2250));
    }
}
