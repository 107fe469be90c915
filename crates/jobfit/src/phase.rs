//! Request lifecycle reporting.

use serde::{Deserialize, Serialize};

/// Where a request is in the pipeline.
///
/// A request moves `Idle -> Validating -> CacheCheck`, then either straight to
/// `Success` on a cache hit or through `RateLimiting -> Calling`, with one
/// `Retrying` per retried attempt, and ends in `Success` or `Error`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum RequestPhase {
    /// Not started
    Idle,
    /// Checking required fields
    Validating,
    /// Looking up the cache
    CacheCheck,
    /// Consulting the rate limiter
    RateLimiting,
    /// Waiting on the upstream call
    Calling,
    /// Waiting before attempt `attempt`
    Retrying {
        /// Attempt about to start
        attempt: u32,
    },
    /// Finished with a result
    Success,
    /// Finished with an error
    Error,
}

impl RequestPhase {
    /// Whether the request has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestPhase::Success | RequestPhase::Error)
    }
}

/// Receives phase transitions, for progress display or metrics.
pub trait PhaseObserver: Send + Sync {
    /// Called on each transition.
    fn on_phase(&self, phase: RequestPhase);
}

impl<F> PhaseObserver for F
where
    F: Fn(RequestPhase) + Send + Sync,
{
    fn on_phase(&self, phase: RequestPhase) {
        self(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(RequestPhase::CacheCheck.to_string(), "cacheCheck");
        assert_eq!(RequestPhase::Retrying { attempt: 2 }.as_ref(), "retrying");
    }

    #[test]
    fn test_terminal_phases() {
        assert!(RequestPhase::Success.is_terminal());
        assert!(RequestPhase::Error.is_terminal());
        assert!(!RequestPhase::Calling.is_terminal());
    }

    #[test]
    fn test_closure_observer() {
        let seen = std::sync::Mutex::new(Vec::new());
        let observer = |phase: RequestPhase| seen.lock().unwrap().push(phase);
        observer.on_phase(RequestPhase::Validating);
        assert_eq!(*seen.lock().unwrap(), vec![RequestPhase::Validating]);
    }
}
