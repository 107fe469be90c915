//! Upstream analysis payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Result of an upstream analysis call.
///
/// The shape is defined by the provider; caches and the orchestrator treat it as an
/// immutable blob.
///
/// # Examples
///
/// ```
/// use jobfit_core::AnalysisResult;
/// use serde_json::json;
///
/// let result = AnalysisResult::from(json!({"score": 82}));
/// assert_eq!(result["score"], 82);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Deref,
)]
#[serde(transparent)]
pub struct AnalysisResult(JsonValue);

impl AnalysisResult {
    /// Wrap a provider payload.
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// Borrow the payload.
    pub fn value(&self) -> &JsonValue {
        &self.0
    }

    /// Take the payload.
    pub fn into_inner(self) -> JsonValue {
        self.0
    }
}
