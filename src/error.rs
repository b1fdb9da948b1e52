//! # Error Types
//!
//! Error types used throughout the raivo library.

use thiserror::Error;

/// Main error type for raivo operations
#[derive(Debug, Error)]
pub enum RaivoError {
    /// Transport-level errors (connection, I/O on the printer link)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Printer discovery could not start or stop
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// The printer refused or failed a job
    #[error("Printer error: {0}")]
    Printer(String),

    /// Document store errors (listener failure, missing document)
    #[error("Store error: {0}")]
    Store(String),

    /// A document could not be decoded into an order
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid command or parameter
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = RaivoError> = std::result::Result<T, E>;
