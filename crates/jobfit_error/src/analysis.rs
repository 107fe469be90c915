//! Classified analysis failures.
//!
//! Every failure surfaced by the orchestrator is an [`AnalysisError`]: a kind from a
//! fixed taxonomy, the fixed user-facing message for that kind, and optional
//! diagnostic detail meant for logs only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure taxonomy for analysis requests.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisErrorKind {
    /// Transport failure: connection refused, reset, timeout
    #[display("network")]
    Network,
    /// Credentials missing, expired or rejected
    #[display("auth")]
    Auth,
    /// The request itself is malformed
    #[display("validation")]
    Validation,
    /// Upstream service failure
    #[display("server")]
    Server,
    /// Rejected locally by the rate limiter before any upstream call
    #[display("rateLimited")]
    RateLimited,
    /// Anything that could not be classified
    #[display("unknown")]
    Unknown,
}

impl AnalysisErrorKind {
    /// Whether a failure of this kind may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisErrorKind::Network
            | AnalysisErrorKind::Server
            | AnalysisErrorKind::RateLimited => true,
            AnalysisErrorKind::Auth
            | AnalysisErrorKind::Validation
            | AnalysisErrorKind::Unknown => false,
        }
    }

    /// Stable, human-readable message shown to end users for this kind.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisErrorKind::Network => {
                "We couldn't reach the analysis service. Check your connection and try again."
            }
            AnalysisErrorKind::Auth => "Your session has expired. Please sign in again.",
            AnalysisErrorKind::Validation => {
                "Some required information is missing or invalid. Please review your input."
            }
            AnalysisErrorKind::Server => {
                "The analysis service is temporarily unavailable. Please try again shortly."
            }
            AnalysisErrorKind::RateLimited => {
                "You've made too many requests. Please wait a moment before trying again."
            }
            AnalysisErrorKind::Unknown => "Something went wrong. Please try again later.",
        }
    }
}

/// Classified analysis failure with location tracking.
///
/// `retryable` and the user-facing message are derived from the kind and cannot be
/// set independently.
///
/// # Examples
///
/// ```
/// use jobfit_error::{AnalysisError, AnalysisErrorKind};
///
/// let err = AnalysisError::new(AnalysisErrorKind::Server).with_details("HTTP 503");
/// assert!(err.retryable());
/// assert_eq!(err.details(), Some("HTTP 503"));
/// assert!(!err.message().contains("503"));
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisError {
    kind: AnalysisErrorKind,
    details: Option<String>,
    reset_at: Option<DateTime<Utc>>,
    retry_after_secs: Option<u64>,
    line: u32,
    file: &'static str,
}

impl AnalysisError {
    /// Create a new analysis error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AnalysisErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            details: None,
            reset_at: None,
            retry_after_secs: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create a rate-limited error telling the caller when to try again.
    #[track_caller]
    pub fn rate_limited(reset_at: DateTime<Utc>, retry_after_secs: u64) -> Self {
        let mut err = Self::new(AnalysisErrorKind::RateLimited);
        err.reset_at = Some(reset_at);
        err.retry_after_secs = Some(retry_after_secs);
        err
    }

    /// Attach diagnostic detail. Never shown to end users.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> AnalysisErrorKind {
        self.kind
    }

    /// User-facing message for this error.
    pub fn message(&self) -> &'static str {
        self.kind.user_message()
    }

    /// Diagnostic detail for logs.
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Whether the failed operation may be retried.
    pub fn retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// When the rejecting rate-limit window resets.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset_at
    }

    /// Seconds until the rejecting rate-limit window resets.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after_secs
    }

    /// Source line where the error was created.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Source file where the error was created.
    pub fn file(&self) -> &'static str {
        self.file
    }
}

impl PartialEq for AnalysisError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.details == other.details
            && self.reset_at == other.reset_at
            && self.retry_after_secs == other.retry_after_secs
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Analysis Error ({}): {}", self.kind, self.message())?;
        if let Some(details) = &self.details {
            write!(f, " [{}]", details)?;
        }
        write!(f, " at line {} in {}", self.line, self.file)
    }
}

impl std::error::Error for AnalysisError {}

impl From<AnalysisErrorKind> for AnalysisError {
    #[track_caller]
    fn from(kind: AnalysisErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Trait for errors that can be classified as retryable or permanent.
///
/// The retry loop consults this after every failed attempt.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    ///
    /// Transient errors like network timeouts or 5xx responses return true.
    /// Permanent errors like 401 (unauthorized) or 400 (bad request) return false.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for AnalysisError {
    fn is_retryable(&self) -> bool {
        self.retryable()
    }
}

/// Serializable view of an [`AnalysisError`] for API responses.
///
/// Carries only what end users may see: no diagnostic detail, no source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAnalysisError {
    /// Error kind
    pub kind: AnalysisErrorKind,
    /// Fixed user-facing message
    pub message: String,
    /// Whether retrying may help
    pub retryable: bool,
    /// When a rate-limit window resets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
    /// Seconds until a rate-limit window resets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl From<&AnalysisError> for PublicAnalysisError {
    fn from(err: &AnalysisError) -> Self {
        Self {
            kind: err.kind,
            message: err.message().to_string(),
            retryable: err.retryable(),
            reset_at: err.reset_at,
            retry_after_secs: err.retry_after_secs,
        }
    }
}
