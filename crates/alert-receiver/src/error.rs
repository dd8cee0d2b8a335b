//! Error types for the alert receiver.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while appending a record to the daily log file.
///
/// These never reach the HTTP caller; the handler counts and logs them.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The log file could not be opened or created.
    #[error("failed to open log file {}: {source}", path.display())]
    Open {
        /// Path of the log file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The serialized record could not be written.
    #[error("failed to write log file {}: {source}", path.display())]
    Write {
        /// Path of the log file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur in the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    /// A request was not answered within the write timeout.
    #[error("request not answered within {0:?}")]
    WriteTimeout(Duration),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for log writer operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
