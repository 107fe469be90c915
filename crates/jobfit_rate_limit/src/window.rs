//! Counting windows and limiter decisions.

use crate::Dimension;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use jobfit_error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Request count for one identity in one dimension.
///
/// Valid while `now < reset_at`. An expired window is replaced whole, never
/// partially reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RateWindow {
    count: u32,
    window_start: DateTime<Utc>,
    reset_at: DateTime<Utc>,
}

impl RateWindow {
    pub(crate) fn fresh(now: DateTime<Utc>, length: chrono::Duration) -> Self {
        Self {
            count: 0,
            window_start: now,
            reset_at: now + length,
        }
    }

    /// Whether the window no longer applies at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_at
    }

    pub(crate) fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }
}

/// Outcome of a single limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDecision {
    dimension: Dimension,
    allowed: bool,
    remaining: u32,
    reset_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
}

impl RateDecision {
    pub(crate) fn allow(dimension: Dimension, limit: u32, window: &RateWindow) -> Self {
        Self {
            dimension,
            allowed: true,
            remaining: limit.saturating_sub(window.count),
            reset_at: window.reset_at,
            retry_after_secs: None,
        }
    }

    pub(crate) fn reject(dimension: Dimension, window: &RateWindow, now: DateTime<Utc>) -> Self {
        Self {
            dimension,
            allowed: false,
            remaining: 0,
            reset_at: window.reset_at,
            retry_after_secs: Some(seconds_until(now, window.reset_at)),
        }
    }

    /// Dimension that produced this decision.
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Whether the request may proceed.
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// Requests left in the current window.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// When the current window ends.
    pub fn reset_at(&self) -> DateTime<Utc> {
        self.reset_at
    }

    /// Seconds to wait before retrying; set only on rejection.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after_secs
    }

    /// The `rateLimited` error for a rejected decision.
    ///
    /// Returns `None` when the request was allowed.
    pub fn to_error(&self) -> Option<AnalysisError> {
        let secs = self.retry_after_secs.filter(|_| !self.allowed)?;
        Some(
            AnalysisError::rate_limited(self.reset_at, secs)
                .with_details(format!("{} limit exceeded", self.dimension)),
        )
    }
}

/// Whole seconds until `reset_at`, rounded up, at least one.
fn seconds_until(now: DateTime<Utc>, reset_at: DateTime<Utc>) -> u64 {
    let millis = (reset_at - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jobfit_error::AnalysisErrorKind;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_seconds_until_rounds_up() {
        assert_eq!(seconds_until(at(0), at(10)), 10);
        assert_eq!(
            seconds_until(at(0), at(9) + chrono::Duration::milliseconds(1)),
            10
        );
        assert_eq!(seconds_until(at(5), at(5)), 1);
    }

    #[test]
    fn test_window_expires_at_reset() {
        let window = RateWindow::fresh(at(0), chrono::Duration::seconds(10));
        assert!(!window.is_expired_at(at(9)));
        assert!(window.is_expired_at(at(10)));
    }

    #[test]
    fn test_rejection_becomes_rate_limited_error() {
        let window = RateWindow::fresh(at(0), chrono::Duration::seconds(60));
        let decision = RateDecision::reject(Dimension::PerUser, &window, at(15));
        let err = decision.to_error().unwrap();

        assert_eq!(err.kind(), AnalysisErrorKind::RateLimited);
        assert_eq!(err.reset_at(), Some(at(60)));
        assert_eq!(err.retry_after_secs(), Some(45));
        assert!(err.retryable());
    }

    #[test]
    fn test_allowed_decision_has_no_error() {
        let mut window = RateWindow::fresh(at(0), chrono::Duration::seconds(60));
        window.increment();
        let decision = RateDecision::allow(Dimension::Burst, 2, &window);
        assert_eq!(decision.remaining(), 1);
        assert!(decision.to_error().is_none());
    }
}
