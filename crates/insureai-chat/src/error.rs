//! Error types for the conversation flow.

use insureai_core::error::ServiceError;

/// Errors from the conversation flow.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("a response is already pending")]
    ResponsePending,
    #[error("no unanswered message to retry")]
    NothingToRetry,
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("state error: {0}")]
    State(String),
}

impl ChatError {
    /// Whether the user may resubmit after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Service(err) => err.is_transient(),
            ChatError::ResponsePending => true,
            _ => false,
        }
    }
}
