//! Error types for the MSX terminal client.

use thiserror::Error;

/// Main error type for msx-term operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport read/write/flush failure (fatal to the affected loop)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transport is no longer open
    #[error("Connection closed")]
    ConnectionClosed,

    /// A received chunk could not be decoded as text
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session already terminated
    #[error("Session already terminated")]
    SessionTerminated,

    /// Invalid input or parameters (generic)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
