//! Error types for the document analysis flow.

use insureai_core::error::{InsureError, ServiceError};

/// Errors from the document analysis flow.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("no document selected")]
    NoDocumentSelected,
    #[error("an analysis is already pending")]
    AnalysisPending,
    /// Client-side validation stopped the document before any request.
    #[error("document rejected: {0}")]
    Rejected(ServiceError),
    /// The analysis service was reached and failed.
    #[error(transparent)]
    Service(ServiceError),
    #[error("invalid report: {0}")]
    InvalidReport(String),
    #[error("no report available")]
    NoReport,
    #[error("export error: {0}")]
    Export(String),
    #[error("state error: {0}")]
    State(String),
}

impl DocumentError {
    /// The classified service failure behind this error, if any.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            DocumentError::Rejected(err) | DocumentError::Service(err) => Some(err),
            _ => None,
        }
    }

    /// Whether resubmitting the same document may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DocumentError::Service(err) if err.is_transient())
    }
}

impl From<InsureError> for DocumentError {
    fn from(err: InsureError) -> Self {
        DocumentError::Export(err.to_string())
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(err: std::io::Error) -> Self {
        DocumentError::Export(err.to_string())
    }
}
