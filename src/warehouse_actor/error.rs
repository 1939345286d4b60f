use thiserror::Error;

use crate::actor_framework::FrameworkError;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WarehouseError {
    #[error("Warehouse not found: {0}")]
    NotFound(String),
    #[error("Warehouse validation error: {0}")]
    ValidationError(String),
    #[error("Catalog resolution failed: {0}")]
    CatalogResolution(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for WarehouseError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => WarehouseError::NotFound(id),
            FrameworkError::Rejected(reason) => WarehouseError::ValidationError(reason),
            other => WarehouseError::ActorCommunicationError(other.to_string()),
        }
    }
}
