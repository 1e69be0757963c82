//! Air-quality acquisition pipeline for the GIOŚ public API.
//!
//! This crate fetches station catalogs, measurement series and index
//! snapshots from the Polish Chief Inspectorate of Environmental Protection,
//! keeps a bounded local history in SQLite and falls back to that history
//! when the remote service is unreachable.
//!
//! # Features
//!
//! - **Remote client**: [`GiosClient`] over the JSON REST API, both key dialects
//! - **Offline fallback**: [`ResilienceController`] tags every result with its [`Provenance`](airq_types::Provenance)
//! - **Bounded history**: samples older than the retention window are pruned on every live fetch
//! - **Analysis**: summaries, anomaly detection and hourly profiles in [`analysis`]
//! - **Polling**: [`Poller`] refreshes sensors in the background
//! - **Testing**: [`MockSource`] with failure and latency injection
//!
//! # Quick Start
//!
//! ```no_run
//! use airq_core::{Config, GiosClient, ResilienceController, SqliteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default()?;
//!     let client = GiosClient::new(&config.remote_base_url, config.request_timeout())?;
//!     let repository = SqliteRepository::open(&config.storage.path)?;
//!     let controller = ResilienceController::from_config(client, repository, &config);
//!
//!     let series = controller.current_series(92).await?;
//!     println!("{} samples, {}", series.data.len(), series.provenance);
//!
//!     let summary = controller.analyze(92, 24).await?;
//!     println!("mean: {:?}, trend: {:?}", summary.mean, summary.trend);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod locks;
pub mod mock;
pub mod poller;
pub mod repository;
pub mod traits;
pub mod wire;

pub use client::{GiosClient, RemoteError, RemoteResult};
pub use config::{Config, ConfigError, StorageConfig};
pub use controller::{ResilienceController, Sourced};
pub use error::{Error, Result};
pub use locks::SensorLocks;
pub use mock::MockSource;
pub use poller::{PollEvent, PollOutcome, Poller};
pub use repository::SqliteRepository;
pub use traits::{CatalogRepository, RemoteSource, SeriesRepository};

// Re-export the domain types used throughout the public API
pub use airq_types::{
    AirQualityIndex, AnalysisSummary, IndexLevel, Provenance, Sample, Sensor, SensorId,
    SourceZone, Station, StationId, SubIndex, Trend,
};
