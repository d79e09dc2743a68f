//! Error types for MoodTrace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MoodTraceError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Quota exceeded for {limit}: {used} used of {max}")]
    QuotaExceeded { limit: String, used: i64, max: i64 },

    #[error("Feature not available on current plan: {feature}")]
    FeatureUnavailable { feature: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type MoodTraceResult<T> = Result<T, MoodTraceError>;
