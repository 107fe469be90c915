//! Analysis requests and their validation.

use crate::CacheKey;
use derive_getters::Getters;
use jobfit_error::{AnalysisError, AnalysisErrorKind};
use serde::{Deserialize, Serialize};

/// Kind of AI analysis requested for a job application.
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
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum OperationKind {
    /// Score how well a resume fits a posting
    JobFit,
    /// Draft a cover letter
    CoverLetter,
    /// Generate interview preparation questions
    InterviewPrep,
    /// Suggest resume edits for a posting
    ResumeTailoring,
    /// List skills the posting asks for that the resume lacks
    SkillGap,
}

impl OperationKind {
    /// Context fields that must be present and non-blank for this operation.
    pub fn required_fields(&self) -> &'static [ContextField] {
        match self {
            OperationKind::JobFit
            | OperationKind::ResumeTailoring
            | OperationKind::SkillGap => &[ContextField::JobDescription, ContextField::Resume],
            OperationKind::CoverLetter => &[
                ContextField::JobDescription,
                ContextField::Resume,
                ContextField::Company,
            ],
            OperationKind::InterviewPrep => &[ContextField::JobDescription, ContextField::JobTitle],
        }
    }
}

/// Named field of an [`AnalysisContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum ContextField {
    /// Posting title
    JobTitle,
    /// Hiring company
    Company,
    /// Full posting text
    JobDescription,
    /// Candidate resume text
    Resume,
    /// Free-form notes from the candidate
    Notes,
}

/// Input material forwarded to the upstream analysis.
///
/// # Examples
///
/// ```
/// use jobfit_core::AnalysisContext;
///
/// let context = AnalysisContext::builder()
///     .job_description("Rust engineer, async experience")
///     .resume("Ten years of systems work")
///     .build()
///     .unwrap();
/// assert_eq!(context.job_description().as_deref(), Some("Rust engineer, async experience"));
/// ```
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_builder::Builder,
)]
#[builder(setter(into, strip_option), default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContext {
    /// Posting title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    job_title: Option<String>,
    /// Hiring company
    #[serde(default, skip_serializing_if = "Option::is_none")]
    company: Option<String>,
    /// Full posting text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    job_description: Option<String>,
    /// Candidate resume text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resume: Option<String>,
    /// Free-form notes from the candidate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl AnalysisContext {
    /// Start building a context.
    pub fn builder() -> AnalysisContextBuilder {
        AnalysisContextBuilder::default()
    }

    /// Look up a field by name.
    pub fn field(&self, field: ContextField) -> Option<&str> {
        match field {
            ContextField::JobTitle => self.job_title.as_deref(),
            ContextField::Company => self.company.as_deref(),
            ContextField::JobDescription => self.job_description.as_deref(),
            ContextField::Resume => self.resume.as_deref(),
            ContextField::Notes => self.notes.as_deref(),
        }
    }
}

/// One analysis request as received by the orchestrator.
///
/// `identity` is the authenticated user and `client_ip` the address already
/// extracted by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Authenticated user id
    identity: String,
    /// Caller address used for per-IP limiting
    #[builder(default = "String::from(\"unknown\")")]
    client_ip: String,
    /// Job application or posting the analysis is about
    resource_id: String,
    /// Requested analysis
    operation: OperationKind,
    /// Input material
    #[builder(default)]
    context: AnalysisContext,
}

impl AnalysisRequest {
    /// Start building a request.
    pub fn builder() -> AnalysisRequestBuilder {
        AnalysisRequestBuilder::default()
    }

    /// Cache key for this request.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.identity, &self.resource_id, self.operation)
    }

    /// Names of required fields that are missing or blank.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.identity.trim().is_empty() {
            missing.push("identity".to_string());
        }
        if self.resource_id.trim().is_empty() {
            missing.push("resourceId".to_string());
        }
        for field in self.operation.required_fields() {
            let present = self
                .context
                .field(*field)
                .is_some_and(|v| !v.trim().is_empty());
            if !present {
                missing.push(field.to_string());
            }
        }
        missing
    }

    /// Reject requests with missing or blank required fields.
    ///
    /// # Errors
    ///
    /// Returns a `validation` [`AnalysisError`] naming the missing fields.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalysisError::new(AnalysisErrorKind::Validation)
                .with_details(format!("missing required fields: {}", missing.join(", "))))
        }
    }
}
