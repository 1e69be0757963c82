//! Local persistence for air-quality measurement series.
//!
//! This crate provides SQLite-based storage for GIOŚ data, so the last
//! retention window of every sensor stays readable while the remote
//! service is down.
//!
//! # Features
//!
//! - Idempotent upsert of samples keyed by sensor and timestamp
//! - Inclusive time-range queries, chronological by default
//! - Retention pruning relative to each sensor's newest sample
//! - Cached station, sensor and index catalog
//! - CSV export
//!
//! # Example
//!
//! ```no_run
//! use airq_store::{SampleQuery, Store};
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_default()?;
//!
//! let query = SampleQuery::new(92).since(OffsetDateTime::now_utc() - Duration::hours(15));
//! let samples = store.query_samples(&query)?;
//! # Ok::<(), airq_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::SeriesInfo;
pub use queries::SampleQuery;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/airq/data.db`
/// - macOS: `~/Library/Application Support/airq/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\airq\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("airq")
        .join("data.db")
}
