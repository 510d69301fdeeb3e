//! Storage error types.

/// Errors from the crossing store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database query or connection failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A unique key is already taken
    #[error("conflict: {key} already exists")]
    Conflict { key: String },

    /// A referenced record does not exist
    #[error("not found: {what}")]
    NotFound { what: String },

    /// A stored row failed validation
    #[error("invalid stored row: {message}")]
    InvalidRow { message: String },
}
