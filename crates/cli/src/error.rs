//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The audit database file does not exist.
    ///
    /// This typically means no tool has been called yet.
    #[error("audit database not found at {path}. Run 'parley serve' or 'parley ask' first")]
    DatabaseNotFound { path: PathBuf },

    /// The listen address could not be parsed.
    #[error("invalid listen address '{addr}': {reason}")]
    InvalidAddr { addr: String, reason: String },

    /// The HTTP client for the built-in tools could not be created.
    #[error("failed to set up tools: {0}")]
    Tools(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
