//! Common error types for songshare

use thiserror::Error;

/// Common result type for songshare operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across songshare crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A plan no longer matches the stored state it was computed from
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored data breaks an invariant the access workflow relies on
    /// (e.g. a user owning two copies of the same original song)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
