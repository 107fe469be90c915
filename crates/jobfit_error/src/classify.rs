//! Failure classification.
//!
//! Turns raw upstream failures into [`AnalysisError`]s. Structured failures (status
//! codes, timeouts, connection errors) are mapped directly; free-form messages fall
//! back to substring matching. Classification is pure, total and deterministic.

use crate::{AnalysisError, AnalysisErrorKind};

const NETWORK_PATTERNS: &[&str] = &["fetch", "network", "timeout", "connection"];
const AUTH_PATTERNS: &[&str] = &["unauthorized", "token", "auth"];
const VALIDATION_PATTERNS: &[&str] = &["invalid", "required", "validation"];

/// Raw failure reported by an upstream analysis call.
///
/// Implementations of the upstream boundary should prefer the structured variants;
/// `Message` exists for third-party failures that carry nothing but text.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum UpstreamError {
    /// HTTP-like status code with response message
    #[display("HTTP {} error: {}", status, message)]
    Status {
        /// Status code
        status: u16,
        /// Response message
        message: String,
    },
    /// The call did not complete in time
    #[display("Request timed out: {}", _0)]
    Timeout(String),
    /// The connection could not be established or was dropped
    #[display("Connection failed: {}", _0)]
    Connection(String),
    /// Unstructured failure text
    #[display("{}", _0)]
    Message(String),
}

impl UpstreamError {
    /// Status-code failure.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        UpstreamError::Status {
            status,
            message: message.into(),
        }
    }

    /// Unstructured failure text.
    pub fn message(message: impl Into<String>) -> Self {
        UpstreamError::Message(message.into())
    }
}

impl std::error::Error for UpstreamError {}

/// Types that can be normalized into the analysis error taxonomy.
pub trait Classify {
    /// Classify this failure. Never panics.
    fn classify(&self) -> AnalysisError;
}

/// Classify any raw failure.
///
/// # Examples
///
/// ```
/// use jobfit_error::{classify, AnalysisErrorKind, UpstreamError};
///
/// let err = classify(&UpstreamError::status(403, "forbidden"));
/// assert_eq!(err.kind(), AnalysisErrorKind::Auth);
///
/// let err = classify("fetch failed: ECONNRESET");
/// assert_eq!(err.kind(), AnalysisErrorKind::Network);
/// assert!(err.retryable());
/// ```
pub fn classify<E: Classify + ?Sized>(raw: &E) -> AnalysisError {
    raw.classify()
}

/// Map an HTTP-like status code to an error kind.
pub fn status_kind(status: u16) -> AnalysisErrorKind {
    match status {
        401 | 403 => AnalysisErrorKind::Auth,
        400..=499 => AnalysisErrorKind::Validation,
        500..=u16::MAX => AnalysisErrorKind::Server,
        _ => AnalysisErrorKind::Unknown,
    }
}

/// Map free-form failure text to an error kind.
///
/// Matching is case-insensitive; patterns are tried network, auth, validation in
/// that order. Non-empty text that matches nothing is treated as a server failure;
/// blank text is unknown.
pub fn message_kind(message: &str) -> AnalysisErrorKind {
    let lowered = message.trim().to_lowercase();
    if lowered.is_empty() {
        return AnalysisErrorKind::Unknown;
    }
    let matches = |patterns: &[&str]| patterns.iter().any(|p| lowered.contains(p));

    if matches(NETWORK_PATTERNS) {
        AnalysisErrorKind::Network
    } else if matches(AUTH_PATTERNS) {
        AnalysisErrorKind::Auth
    } else if matches(VALIDATION_PATTERNS) {
        AnalysisErrorKind::Validation
    } else {
        AnalysisErrorKind::Server
    }
}

/// Classify a status-code failure.
pub fn classify_status(status: u16, message: &str) -> AnalysisError {
    AnalysisError::new(status_kind(status)).with_details(format!("HTTP {}: {}", status, message))
}

/// Classify a free-form failure message.
pub fn classify_message(message: &str) -> AnalysisError {
    let err = AnalysisError::new(message_kind(message));
    if message.trim().is_empty() {
        err
    } else {
        err.with_details(message.to_string())
    }
}

/// Classify an arbitrary error, walking its source chain.
///
/// Known structured types anywhere in the chain win over text matching; only when
/// none is found is the outermost error's message matched.
pub fn classify_error(err: &(dyn std::error::Error + 'static)) -> AnalysisError {
    let chain = std::iter::successors(Some(err), |e| e.source());
    for e in chain {
        if let Some(analysis) = e.downcast_ref::<AnalysisError>() {
            return analysis.clone();
        }
        if let Some(upstream) = e.downcast_ref::<UpstreamError>() {
            return upstream.classify();
        }
        #[cfg(feature = "reqwest")]
        if let Some(http) = e.downcast_ref::<reqwest::Error>() {
            return UpstreamError::from(http).classify();
        }
    }
    classify_message(&err.to_string())
}

impl Classify for UpstreamError {
    fn classify(&self) -> AnalysisError {
        match self {
            UpstreamError::Status { status, message } => classify_status(*status, message),
            UpstreamError::Timeout(detail) => AnalysisError::new(AnalysisErrorKind::Network)
                .with_details(format!("timeout: {}", detail)),
            UpstreamError::Connection(detail) => AnalysisError::new(AnalysisErrorKind::Network)
                .with_details(format!("connection: {}", detail)),
            UpstreamError::Message(message) => classify_message(message),
        }
    }
}

impl Classify for AnalysisError {
    fn classify(&self) -> AnalysisError {
        self.clone()
    }
}

impl Classify for str {
    fn classify(&self) -> AnalysisError {
        classify_message(self)
    }
}

impl Classify for String {
    fn classify(&self) -> AnalysisError {
        classify_message(self)
    }
}

impl<T: Classify + ?Sized> Classify for &T {
    fn classify(&self) -> AnalysisError {
        (**self).classify()
    }
}

impl Classify for dyn std::error::Error + Send + Sync + 'static {
    fn classify(&self) -> AnalysisError {
        classify_error(self)
    }
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    fn classify(&self) -> AnalysisError {
        (**self).classify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ranges() {
        let cases = [
            (400, AnalysisErrorKind::Validation),
            (401, AnalysisErrorKind::Auth),
            (403, AnalysisErrorKind::Auth),
            (404, AnalysisErrorKind::Validation),
            (422, AnalysisErrorKind::Validation),
            (429, AnalysisErrorKind::Validation),
            (500, AnalysisErrorKind::Server),
            (503, AnalysisErrorKind::Server),
            (302, AnalysisErrorKind::Unknown),
            (0, AnalysisErrorKind::Unknown),
        ];
        for (status, expected) in cases {
            assert_eq!(status_kind(status), expected, "status {}", status);
        }
    }

    #[test]
    fn message_patterns_are_case_insensitive() {
        assert_eq!(message_kind("Failed to FETCH"), AnalysisErrorKind::Network);
        assert_eq!(message_kind("Unauthorized"), AnalysisErrorKind::Auth);
        assert_eq!(message_kind("Field is REQUIRED"), AnalysisErrorKind::Validation);
    }

    #[test]
    fn network_patterns_win_over_auth() {
        // "token" and "timeout" both present: network is checked first
        assert_eq!(
            message_kind("token refresh timeout"),
            AnalysisErrorKind::Network
        );
    }

    #[test]
    fn blank_message_is_unknown() {
        let err = classify_message("   ");
        assert_eq!(err.kind(), AnalysisErrorKind::Unknown);
        assert!(!err.retryable());
        assert_eq!(err.details(), None);
    }

    #[test]
    fn unmatched_message_is_server() {
        assert_eq!(message_kind("model overloaded"), AnalysisErrorKind::Server);
    }
}
