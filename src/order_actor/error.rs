use thiserror::Error;

use crate::actor_framework::FrameworkError;

/// Errors that can occur during order store operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order rejected: {0}")]
    Rejected(String),
    #[error("Unexpected result for {action}: {result}")]
    UnexpectedResult { action: String, result: String },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for OrderError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            FrameworkError::Rejected(reason) => OrderError::Rejected(reason),
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}
