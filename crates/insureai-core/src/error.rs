use thiserror::Error;

/// Top-level error type for the InsureAI workspace.
///
/// Flow crates define their own error types and wrap [`ServiceError`] for
/// anything that crossed a service boundary. `InsureError` covers the
/// infrastructure concerns shared by every crate: configuration, I/O and
/// serialization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InsureError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for InsureError {
    fn from(err: toml::de::Error) -> Self {
        InsureError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for InsureError {
    fn from(err: toml::ser::Error) -> Self {
        InsureError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for InsureError {
    fn from(err: serde_json::Error) -> Self {
        InsureError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for InsureAI infrastructure operations.
pub type Result<T> = std::result::Result<T, InsureError>;

/// Classified failure of a conversation or analysis request.
///
/// Scoped to the flow that produced it; none of these is fatal to the
/// application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("document size {size} bytes exceeds limit of {limit} bytes")]
    SizeExceeded { size: u64, limit: u64 },

    #[error("malformed content: {0}")]
    MalformedContent(String),
}

impl ServiceError {
    /// Transient failures are reported inline and may be retried as-is.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ServiceError::ServiceUnavailable(_) | ServiceError::Timeout(_)
        )
    }

    /// Failures detected client-side that must stop a request before it is sent.
    pub fn blocks_submission(&self) -> bool {
        matches!(
            self,
            ServiceError::UnsupportedFormat(_) | ServiceError::SizeExceeded { .. }
        )
    }
}
