//! Transport-level error types.

use thiserror::Error;

/// Errors raised by a [`Connection`](crate::Connection) implementation.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection to the server failed.
    #[error("connection failed: {addr} - {reason}")]
    ConnectionFailed {
        /// Address that was dialed.
        addr: String,
        /// Reason for failure.
        reason: String,
    },

    /// The connection is gone and cannot carry more lines.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
