//! Durable store error types.

/// Kinds of durable store errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create the store directory
    #[display("Failed to create store directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write an entry
    #[display("Failed to write entry: {}", _0)]
    Write(String),
    /// Failed to read an entry
    #[display("Failed to read entry: {}", _0)]
    Read(String),
    /// Failed to remove an entry
    #[display("Failed to remove entry: {}", _0)]
    Remove(String),
    /// Failed to enumerate entries
    #[display("Failed to list entries: {}", _0)]
    List(String),
    /// Stored document could not be decoded
    #[display("Corrupt entry: {}", _0)]
    Corrupt(String),
    /// Store backend is unavailable
    #[display("Store unavailable: {}", _0)]
    Unavailable(String),
}

/// Durable store error with location tracking.
///
/// # Examples
///
/// ```
/// use jobfit_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::Read("/var/jobfit/cache/ab".to_string()));
/// assert!(format!("{}", err).contains("Failed to read"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StorageErrorKind {
        &self.kind
    }
}
