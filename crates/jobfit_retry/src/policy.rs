//! Backoff schedule.

use jobfit_core::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// How many attempts to make and how long to wait between them.
///
/// The nominal delay before retry `n` (after failed attempt `n`) is
/// `min(base_delay * backoff_factor^(n-1), max_delay)`. Jitter then moves it by
/// `delay * jitter * (r - 0.5)` for a uniform `r` in `[0, 1)`, never below zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_factor: f64,
    max_delay: Duration,
    jitter: f64,
    attempt_timeout: Option<Duration>,
    overall_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: (*config.max_attempts()).max(1),
            base_delay: Duration::from_millis(*config.base_delay_ms()),
            backoff_factor: *config.backoff_factor(),
            max_delay: Duration::from_millis(*config.max_delay_ms()),
            jitter: *config.jitter(),
            attempt_timeout: config.attempt_timeout_ms().map(Duration::from_millis),
            overall_timeout: config.overall_timeout_ms().map(Duration::from_millis),
        }
    }
}

impl RetryPolicy {
    /// Build a policy without timeouts.
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        backoff_factor: f64,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            backoff_factor,
            max_delay,
            jitter: 0.0,
            attempt_timeout: None,
            overall_timeout: None,
        }
    }

    /// Set the jitter fraction, clamped to `[0, 1]`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Bound each attempt.
    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Bound the whole call, attempts and delays included.
    pub fn with_overall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.overall_timeout = timeout;
        self
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Jitter fraction.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Deadline for a single attempt.
    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    /// Deadline across all attempts.
    pub fn overall_timeout(&self) -> Option<Duration> {
        self.overall_timeout
    }

    /// Delay after failed attempt `attempt` (1-based), before jitter.
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else if capped > 0.0 {
            self.max_delay
        } else {
            Duration::ZERO
        }
    }

    /// Delay after failed attempt `attempt` with a random jitter sample.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let sample = rand::thread_rng().gen_range(0.0..1.0);
        self.jittered(attempt, sample)
    }

    /// Delay after failed attempt `attempt` for a given jitter sample in `[0, 1)`.
    pub fn jittered(&self, attempt: u32, sample: f64) -> Duration {
        let nominal = self.nominal_delay(attempt).as_secs_f64();
        let shifted = nominal + nominal * self.jitter * (sample - 0.5);
        Duration::from_secs_f64(shifted.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(5, Duration::from_secs(1), 2.0, Duration::from_secs(10))
    }

    #[test]
    fn test_nominal_delay_doubles_then_caps() {
        let policy = policy();
        assert_eq!(policy.nominal_delay(1), Duration::from_secs(1));
        assert_eq!(policy.nominal_delay(2), Duration::from_secs(2));
        assert_eq!(policy.nominal_delay(3), Duration::from_secs(4));
        assert_eq!(policy.nominal_delay(4), Duration::from_secs(8));
        assert_eq!(policy.nominal_delay(5), Duration::from_secs(10));
        assert_eq!(policy.nominal_delay(60), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = policy().with_jitter(0.25);
        assert_eq!(policy.jittered(1, 0.5), Duration::from_secs(1));
        assert_eq!(policy.jittered(1, 0.0), Duration::from_millis(875));
        assert!(policy.jittered(1, 0.999_999) < Duration::from_millis(1_125));

        for _ in 0..100 {
            let delay = policy.delay_for(2);
            assert!(delay >= Duration::from_millis(1_750));
            assert!(delay <= Duration::from_millis(2_250));
        }
    }

    #[test]
    fn test_no_jitter_is_exact() {
        assert_eq!(policy().delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from(&RetryConfig::default());
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.jitter(), 0.25);
        assert_eq!(policy.attempt_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(policy.overall_timeout(), None);
    }
}
