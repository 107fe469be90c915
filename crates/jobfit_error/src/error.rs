//! Top-level error wrapper types.

use crate::{AnalysisError, ConfigError, JsonError, StorageError};

/// Every error the Jobfit crates can produce.
///
/// # Examples
///
/// ```
/// use jobfit_error::{ConfigError, JobfitError};
///
/// let err: JobfitError = ConfigError::new("cache_max_entries must be positive").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum JobfitErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Durable store error
    #[from(StorageError)]
    Storage(StorageError),
    /// Classified analysis failure
    #[from(AnalysisError)]
    Analysis(AnalysisError),
}

/// Jobfit error with kind discrimination.
///
/// # Examples
///
/// ```
/// use jobfit_error::{JobfitResult, StorageError, StorageErrorKind};
///
/// fn might_fail() -> JobfitResult<()> {
///     Err(StorageError::new(StorageErrorKind::Unavailable("disk full".to_string())))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Jobfit Error: {}", _0)]
pub struct JobfitError(Box<JobfitErrorKind>);

impl JobfitError {
    /// Create a new error from a kind.
    pub fn new(kind: JobfitErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &JobfitErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to JobfitErrorKind
impl<T> From<T> for JobfitError
where
    T: Into<JobfitErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Jobfit operations.
pub type JobfitResult<T> = std::result::Result<T, JobfitError>;
