//! The model provider seam.

use jobfit_core::{AnalysisRequest, AnalysisResult};
use jobfit_error::UpstreamError;

/// Performs the actual AI analysis.
///
/// Implementations report failures as structured [`UpstreamError`]s where they
/// can (HTTP status, timeout, connection) so classification does not depend on
/// message text.
#[async_trait::async_trait]
pub trait Upstream: Send + Sync + std::fmt::Debug {
    /// Run the analysis for `request`.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, UpstreamError>;
}
