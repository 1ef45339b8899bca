use thiserror::Error;

/// Workspace-level errors. The store and gateway carry their own richer
/// error types; this covers the shared config/bootstrap surface.
#[derive(Debug, Error)]
pub enum LeavelineError {
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LeavelineError>;
