//! Remote review-management API boundary.
//!
//! The engine never talks to the network itself. It drives a [`ReviewApi`]
//! implementation and classifies the [`ApiError`]s it returns.

mod memory;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::{ApiCall, InMemoryReviewApi};

use crate::error::Error;
use crate::types::{Category, MilestoneSnapshot};

/// Result type for remote API calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Error code documented by the remote review API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Throttling,
    ServiceUnavailable,
    InternalServer,
    ResourceNotFound,
    AccessDenied,
    Validation,
    Conflict,
    /// Any code the engine does not know about.
    Other(String),
}

impl ErrorCode {
    /// Parse the service's wire code.
    #[must_use]
    pub fn parse(code: &str) -> Self {
        match code {
            "ThrottlingException" => Self::Throttling,
            "ServiceUnavailableException" => Self::ServiceUnavailable,
            "InternalServerException" => Self::InternalServer,
            "ResourceNotFoundException" => Self::ResourceNotFound,
            "AccessDeniedException" => Self::AccessDenied,
            "ValidationException" => Self::Validation,
            "ConflictException" => Self::Conflict,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire representation of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Throttling => "ThrottlingException",
            Self::ServiceUnavailable => "ServiceUnavailableException",
            Self::InternalServer => "InternalServerException",
            Self::ResourceNotFound => "ResourceNotFoundException",
            Self::AccessDenied => "AccessDeniedException",
            Self::Validation => "ValidationException",
            Self::Conflict => "ConflictException",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by the remote review API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Throttling, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }
}

/// Workload definition sent when registering a workload for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub name: String,
    pub description: String,
    pub environment: String,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub lenses: Vec<String>,
}

/// Workload as known to the remote system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub id: String,
    pub arn: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub lenses: Vec<String>,
}

/// Risk level reported on a remote answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerRisk {
    Unanswered,
    High,
    Medium,
    None,
    NotApplicable,
}

impl AnswerRisk {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unanswered => "UNANSWERED",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::None => "NONE",
            Self::NotApplicable => "NOT_APPLICABLE",
        }
    }
}

/// A choice as described by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSummary {
    pub choice_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One answer record returned when listing answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSummary {
    pub question_id: String,
    pub pillar_id: Category,
    pub question_title: String,
    #[serde(default)]
    pub question_description: String,
    #[serde(default)]
    pub choices: Vec<ChoiceSummary>,
    #[serde(default)]
    pub selected_choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<AnswerRisk>,
    #[serde(default = "default_applicable")]
    pub is_applicable: bool,
    #[serde(default)]
    pub notes: String,
}

fn default_applicable() -> bool {
    true
}

/// Request for one page of answers in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAnswersRequest {
    pub workload_id: String,
    pub lens_alias: String,
    pub pillar_id: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    pub max_results: u32,
}

/// One page of answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerPage {
    pub answers: Vec<AnswerSummary>,
    /// Continuation token; `None` on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Update of the choices selected on one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAnswerRequest {
    pub workload_id: String,
    pub lens_alias: String,
    pub question_id: String,
    pub selected_choices: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

/// Handle of a freshly created milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRef {
    pub workload_id: String,
    pub milestone_id: String,
}

/// Format of the consolidated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Json,
}

impl ReportFormat {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Json => "JSON",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "json" => Ok(Self::Json),
            _ => Err(Error::UnsupportedReportFormat(s.to_string())),
        }
    }
}

/// Operations of the remote review-management service.
///
/// Implementations perform exactly one remote request per call; retrying is
/// the engine's job.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    /// Register a workload for review.
    async fn create_workload(&self, spec: &WorkloadSpec) -> ApiResult<Workload>;

    /// Fetch a workload by id.
    async fn get_workload(&self, workload_id: &str) -> ApiResult<Workload>;

    /// Fetch one page of answers for a category.
    async fn list_answers(&self, request: &ListAnswersRequest) -> ApiResult<AnswerPage>;

    /// Replace the selected choices and notes of one answer.
    async fn update_answer(&self, request: &UpdateAnswerRequest) -> ApiResult<AnswerSummary>;

    /// Record a named milestone of the workload's current state.
    async fn create_milestone(&self, workload_id: &str, name: &str) -> ApiResult<MilestoneRef>;

    /// Fetch an existing milestone.
    async fn get_milestone(
        &self,
        workload_id: &str,
        milestone_id: &str,
    ) -> ApiResult<MilestoneSnapshot>;

    /// Fetch the consolidated report, base64 encoded.
    async fn get_consolidated_report(
        &self,
        workload_id: &str,
        format: ReportFormat,
    ) -> ApiResult<String>;
}
