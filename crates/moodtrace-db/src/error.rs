//! Database-specific error types and conversions.

use moodtrace_core::error::MoodTraceError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for MoodTraceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => MoodTraceError::NotFound { entity, id },
            other => MoodTraceError::Database(other.to_string()),
        }
    }
}
