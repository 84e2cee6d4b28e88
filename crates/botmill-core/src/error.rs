//! Botmill error types.

use thiserror::Error;

/// Workspace-wide error type.
#[derive(Debug, Error)]
pub enum BotmillError {
    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// Spawning a job process failed before the process started.
    #[error("Spawn error: {0}")]
    Spawn(String),

    /// Underlying I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, BotmillError>;
