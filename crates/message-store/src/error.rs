//! Store error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller is not allowed to touch the record
    #[error("not allowed to modify {entity} {id}")]
    PermissionDenied { entity: &'static str, id: String },

    /// Payload failed validation
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
