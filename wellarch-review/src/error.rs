//! Error types for the review engine.

use thiserror::Error;

use crate::api::ApiError;
use crate::types::Category;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during review operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No remote workload id was supplied.
    #[error("workload id is required")]
    MissingWorkloadId,

    /// One or both milestone ids were not supplied.
    #[error("both snapshot ids are required")]
    MissingSnapshotIds,

    /// The scope is missing a field its level requires.
    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No question with this id exists in any category.
    #[error("question not found: {0}")]
    QuestionNotFound(String),

    /// Report format other than pdf or json.
    #[error("unsupported report format: {0}")]
    UnsupportedReportFormat(String),

    /// Remote call failed with an error that is not retried.
    #[error("{operation} failed: {source}")]
    Remote {
        operation: String,
        #[source]
        source: ApiError,
    },

    /// Remote call kept failing with retryable errors.
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: ApiError,
    },

    /// The caller cancelled while a remote call was pending or backing off.
    #[error("{operation} cancelled")]
    Cancelled { operation: String },

    /// The remote returned the page token it was just sent.
    #[error("{operation} returned the same page token {token} again")]
    PaginationStalled { operation: String, token: String },

    /// Fetching one category's answers failed.
    #[error("fetching {category} questions failed: {source}")]
    CategoryFetch {
        category: Category,
        #[source]
        source: Box<Error>,
    },

    /// Fetching one of the two compared milestones failed.
    #[error("fetching snapshot {snapshot} failed: {source}")]
    SnapshotFetch {
        snapshot: u8,
        #[source]
        source: Box<Error>,
    },

    /// Report payload was not valid base64.
    #[error("report decode error: {0}")]
    ReportDecode(#[from] base64::DecodeError),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Remote error code behind this error, looking through category and
    /// snapshot context.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Remote { source, .. } | Self::RetriesExhausted { source, .. } => Some(source),
            Self::CategoryFetch { source, .. } | Self::SnapshotFetch { source, .. } => {
                source.api_error()
            }
            _ => None,
        }
    }

    /// Whether the caller's cancellation ended the operation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::CategoryFetch { source, .. } | Self::SnapshotFetch { source, .. } => {
                source.is_cancelled()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorCode;

    #[test]
    fn missing_ids_have_distinct_messages() {
        assert_eq!(Error::MissingWorkloadId.to_string(), "workload id is required");
        assert_eq!(
            Error::MissingSnapshotIds.to_string(),
            "both snapshot ids are required"
        );
    }

    #[test]
    fn remote_error_keeps_operation_and_code() {
        let err = Error::Remote {
            operation: "GetWorkload".into(),
            source: ApiError::new(ErrorCode::AccessDenied, "no access"),
        };
        assert_eq!(
            err.to_string(),
            "GetWorkload failed: AccessDeniedException: no access"
        );
    }

    #[test]
    fn api_error_is_found_through_context_wrappers() {
        let err = Error::CategoryFetch {
            category: Category::Security,
            source: Box::new(Error::RetriesExhausted {
                operation: "ListAnswers".into(),
                attempts: 3,
                source: ApiError::throttled("slow down"),
            }),
        };
        assert_eq!(err.api_error().unwrap().code, ErrorCode::Throttling);
        assert!(err.to_string().contains("security"));
        assert!(!err.is_cancelled());
    }
}
