//! Error types for the Jobfit analysis orchestrator.
//!
//! Two families live here:
//!
//! - The **analysis taxonomy**: [`AnalysisError`] with an [`AnalysisErrorKind`]
//!   (`network`, `auth`, `validation`, `server`, `rateLimited`, `unknown`) and the
//!   classifier that maps raw upstream failures onto it.
//! - **Infrastructure errors** following the `ErrorKind` + wrapper struct pattern:
//!   each captures its source location with `#[track_caller]` and converts into the
//!   top-level [`JobfitError`].
//!
//! # Examples
//!
//! ```
//! use jobfit_error::{classify, AnalysisErrorKind, UpstreamError};
//!
//! let err = classify(&UpstreamError::status(502, "bad gateway"));
//! assert_eq!(err.kind(), AnalysisErrorKind::Server);
//! assert!(err.retryable());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analysis;
mod classify;
mod config;
mod error;
#[cfg(feature = "reqwest")]
mod http;
mod json;
mod storage;

pub use analysis::{AnalysisError, AnalysisErrorKind, PublicAnalysisError, RetryableError};
pub use classify::{
    Classify, UpstreamError, classify, classify_error, classify_message, classify_status,
    message_kind, status_kind,
};
pub use config::ConfigError;
pub use error::{JobfitError, JobfitErrorKind, JobfitResult};
pub use json::{JsonError, JsonOperation};
pub use storage::{StorageError, StorageErrorKind};
