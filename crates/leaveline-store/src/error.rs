use thiserror::Error;

/// Errors that can occur during leave application store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested application does not exist.
    #[error("application not found: {id}")]
    NotFound { id: String },

    /// Status transition rejected — only pending applications can be decided.
    #[error("invalid transition for application {id}: already {status}")]
    InvalidTransition { id: String, status: String },

    /// A SQLite operation failed (including rows that no longer parse
    /// back into their domain types).
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
