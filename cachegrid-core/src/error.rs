//! Error types for the cache-grid core library.

use thiserror::Error;

/// Top-level error type for all cache-grid operations.
#[derive(Error, Debug)]
pub enum GridError {
    /// Durable data is present but does not decode as a persisted snapshot.
    ///
    /// Callers on the load path treat this as "no snapshot" and start from a
    /// clean world.
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// A world-memory key did not have the `<i>:<j>` shape.
    #[error("Invalid cell key: {0:?}")]
    InvalidCellKey(String),

    /// Serialization failure while encoding state.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, GridError>;
