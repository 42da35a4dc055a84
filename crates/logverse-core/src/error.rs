//! Error types for logverse-core

use thiserror::Error;

/// Result type alias using logverse-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in logverse-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local store error
    #[error("Local store error: {0}")]
    LocalStore(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No signed-in user to scope persisted data to
    #[error("No signed-in user")]
    NotSignedIn,
}
