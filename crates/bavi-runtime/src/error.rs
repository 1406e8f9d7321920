//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use bavi_core::TransportError;
use bavi_framework::StorageError;

/// Errors that stop the runtime from starting or running.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The IRC connection could not be established.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The storage database could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The logging subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
