//! Cart service error types.

use phrixus_model::{ModelError, StoreError};
use thiserror::Error;

/// Result type for cart service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The record does not exist, or exists but is not owned by the caller.
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Model(ModelError),
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Store(StoreError::NotFound(path)) => ServiceError::NotFound(path),
            other => ServiceError::Model(other),
        }
    }
}
