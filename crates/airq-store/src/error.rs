//! Error types for airq-store.

use std::path::PathBuf;

/// Result type for airq-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in airq-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid timestamp stored or supplied.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Stored row no longer decodes into a domain value.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
