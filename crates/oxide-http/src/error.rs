//! Error types for the HTTP layer.

use std::net::SocketAddr;

use thiserror::Error;

/// A type-erased error raised by a handler while serving a request.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP layer errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while accepting or serving connections.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server task ended abnormally.
    #[error("server task failed: {0}")]
    Join(String),
}

/// Result type alias for HTTP layer operations.
pub type Result<T> = std::result::Result<T, HttpError>;
