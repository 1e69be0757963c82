//! Error types for data parsing in airq-types.

use thiserror::Error;

/// Errors that can occur when turning wire text into domain values.
///
/// This error type carries no transport details (those belong in airq-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A value that should be numeric could not be parsed.
    #[error("Invalid number: '{0}'")]
    InvalidNumber(String),

    /// A timestamp did not match any of the accepted formats.
    #[error("Invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    /// A time zone name or offset that could not be resolved.
    #[error("Invalid time zone: '{0}'")]
    InvalidZone(String),

    /// An index level outside the 0..=5 scale (and not the "no index" marker).
    #[error("Invalid index level: {0} (expected 0-5)")]
    InvalidIndexLevel(i64),

    /// A required field was missing from a record.
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

/// Result type alias using airq-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
