//! Common error types for bmcat

use thiserror::Error;

/// Common result type for bmcat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across bmcat crates
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

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the underlying SQLite error is a lock/busy condition worth retrying
    pub fn is_database_locked(&self) -> bool {
        match self {
            Error::Database(db_err) => is_sqlite_lock_error(db_err),
            _ => false,
        }
    }
}

/// SQLite reports contention as "database is locked" (SQLITE_BUSY/SQLITE_LOCKED)
pub fn is_sqlite_lock_error(err: &sqlx::Error) -> bool {
    let message = err.to_string();
    message.contains("database is locked") || message.contains("database table is locked")
}
