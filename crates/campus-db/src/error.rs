//! Database-specific error types and conversions.

use campus_core::error::CampusError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// A unique index rejected the write.
    #[error("Duplicate {entity}: {detail}")]
    Duplicate { entity: String, detail: String },
}

impl From<DbError> for CampusError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CampusError::NotFound { entity, id },
            DbError::Duplicate { entity, .. } => CampusError::AlreadyExists { entity },
            other => CampusError::Database(other.to_string()),
        }
    }
}
