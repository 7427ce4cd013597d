//! Error types for the Mirage platform.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirageError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    Conflict { entity: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Authentication failed: {reason}")]
    Unauthenticated { reason: String },

    #[error("Permission denied: {reason}")]
    Forbidden { reason: String },

    #[error("Node {node_id} is inactive")]
    NodeInactive { node_id: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MirageError {
    /// Short stable code surfaced in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            MirageError::NotFound { .. } => "not_found",
            MirageError::Conflict { .. } => "conflict",
            MirageError::InvalidInput { .. } => "invalid_input",
            MirageError::Unauthenticated { .. } => "unauthenticated",
            MirageError::Forbidden { .. } => "forbidden",
            MirageError::NodeInactive { .. } => "node_inactive",
            MirageError::StorageUnavailable(_) => "storage_unavailable",
            MirageError::Database(_) => "database",
            MirageError::Crypto(_) => "crypto",
            MirageError::Internal(_) => "internal",
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        MirageError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        MirageError::Unauthenticated {
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        MirageError::Forbidden {
            reason: reason.into(),
        }
    }
}

pub type MirageResult<T> = Result<T, MirageError>;
