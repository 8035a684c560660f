//! Error types for entity mapping and remote store access.

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Result type for remote store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a [`RemoteStore`](crate::RemoteStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("remote store rejected request ({status}): {error}: {description}")]
    Api {
        status: u16,
        error: String,
        description: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for entity operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by entity lifecycle operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The entity failed validation; nothing was sent to the store.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The entity has no uuid, name or username to address it by.
    #[error("{entity_type} has no uuid, name or username")]
    MissingIdentifier { entity_type: String },

    /// The entity was deleted and can no longer be used.
    #[error("{entity_type} instance has been deleted")]
    Deleted { entity_type: String },

    #[error("unknown entity type: {0}")]
    UnknownType(String),

    #[error("entity type already registered: {0}")]
    DuplicateType(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ModelError {
    /// Returns true if the remote store reported the record as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::Store(StoreError::NotFound(_)))
    }

    /// Returns the validation errors if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ModelError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
