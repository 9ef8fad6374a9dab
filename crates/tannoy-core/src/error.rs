//! Tannoy error types.

use thiserror::Error;

/// Errors surfaced across crate boundaries.
#[derive(Debug, Error)]
pub enum TannoyError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand used throughout the workspace.
pub type Result<T> = std::result::Result<T, TannoyError>;
