//! Database-specific error types and conversions.

use mirage_core::error::MirageError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Uniqueness violation: {entity}")]
    Conflict { entity: String },

    #[error("Malformed row: {0}")]
    Row(String),
}

impl DbError {
    /// Reinterpret a write failure as a uniqueness conflict when the
    /// engine reports an index violation.
    pub fn or_conflict(self, entity: &str) -> Self {
        match &self {
            DbError::Surreal(e) => {
                let msg = e.to_string();
                if msg.contains("index") || msg.contains("already exists") {
                    DbError::Conflict {
                        entity: entity.into(),
                    }
                } else {
                    self
                }
            }
            _ => self,
        }
    }
}

impl From<DbError> for MirageError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => MirageError::NotFound { entity, id },
            DbError::Conflict { entity } => MirageError::Conflict { entity },
            other => MirageError::Database(other.to_string()),
        }
    }
}
