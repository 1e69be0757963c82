//! Error types for airq-core.
//!
//! The remote client and the store surface their own failures
//! ([`RemoteError`] and [`airq_store::Error`]); the
//! [`ResilienceController`](crate::ResilienceController) is the only place a
//! remote failure turns into a cache lookup.
//!
//! | Error | Raised when |
//! |-------|-------------|
//! | [`Error::RemoteUnavailable`] | Network failure, timeout, non-success status or unparseable payload |
//! | [`Error::Storage`] | The local database failed |
//! | [`Error::NoDataAvailable`] | The remote failed and nothing usable was cached |
//! | [`Error::InvalidConfig`] | Configuration rejected before any work started |
//!
//! There is no error for a series too short to analyse: summaries report
//! those fields as `None`.

use thiserror::Error;

use crate::client::RemoteError;

/// Errors produced by the acquisition pipeline.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The remote service could not deliver a usable response.
    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(#[from] RemoteError),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] airq_store::Error),

    /// The remote service failed and the cache holds nothing for the request.
    #[error("No data available for {what}: remote unavailable and nothing cached")]
    NoDataAvailable {
        /// What was requested, e.g. `sensor 92`.
        what: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Build a [`Error::NoDataAvailable`] for the given request.
    pub fn no_data(what: impl Into<String>) -> Self {
        Self::NoDataAvailable { what: what.into() }
    }

    /// Whether this error came from the remote service.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }
}

/// Result type alias using airq-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = Error::no_data("sensor 92");
        assert_eq!(
            err.to_string(),
            "No data available for sensor 92: remote unavailable and nothing cached"
        );

        let err = Error::InvalidConfig("retention_hours must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: retention_hours must be positive"
        );
    }

    #[test]
    fn test_remote_conversion() {
        let err: Error = RemoteError::Timeout {
            operation: "data/getData/92".to_string(),
            duration: Duration::from_secs(30),
        }
        .into();
        assert!(err.is_remote());
        assert!(err.to_string().starts_with("Remote service unavailable"));
    }

    #[test]
    fn test_storage_conversion() {
        let err: Error = airq_store::Error::InvalidTimestamp("bad".to_string()).into();
        assert!(matches!(err, Error::Storage(_)));
        assert!(!err.is_remote());
    }
}
