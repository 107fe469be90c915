//! Errors encoding and decoding stored JSON documents.

/// Direction of a failed JSON conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum JsonOperation {
    /// Value to document
    #[display("encode")]
    Encode,
    /// Document to value
    #[display("decode")]
    Decode,
}

/// A stored document could not be converted, with its key and source location.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: {} {}: {} at line {} in {}", operation, document, message, line, file)]
pub struct JsonError {
    /// Whether the document was being written or read
    pub operation: JsonOperation,
    /// Storage key of the document
    pub document: String,
    /// The serializer's message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// A value could not be written as the document `document`.
    #[track_caller]
    pub fn encode(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at(JsonOperation::Encode, document.into(), message.into())
    }

    /// The document stored under `document` could not be read.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobfit_error::{JsonError, JsonOperation};
    ///
    /// let err = JsonError::decode("jobfit:cache:userA:job123:jobFit", "expected value");
    /// assert_eq!(err.operation, JsonOperation::Decode);
    /// assert!(err.to_string().contains("decode jobfit:cache:userA:job123:jobFit"));
    /// ```
    #[track_caller]
    pub fn decode(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at(JsonOperation::Decode, document.into(), message.into())
    }

    #[track_caller]
    fn at(operation: JsonOperation, document: String, message: String) -> Self {
        let location = std::panic::Location::caller();
        Self {
            operation,
            document,
            message,
            line: location.line(),
            file: location.file(),
        }
    }
}
