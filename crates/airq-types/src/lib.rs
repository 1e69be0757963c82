//! Domain types for GIOŚ air-quality data.
//!
//! This crate provides the value objects shared by the store (airq-store),
//! the acquisition pipeline (airq-core) and presentation layers (airq-cli).
//!
//! # Features
//!
//! - Station, sensor and measurement (sample) types
//! - Air-quality index snapshots with per-parameter sub-indices
//! - Analysis summary and trend classification types
//! - Parsing of textual wire values, including the "no reading" convention
//! - The publisher's time zone, with daylight-saving rules
//!
//! # Example
//!
//! ```
//! use airq_types::{Sample, SourceZone, text};
//!
//! let ts = text::parse_timestamp("2024-03-01 13:00:00", SourceZone::WARSAW)?;
//! let value = text::parse_value("")?;
//! let sample = Sample { sensor_id: 92, timestamp: ts, value };
//! assert!(!sample.is_present());
//! # Ok::<(), airq_types::ParseError>(())
//! ```

pub mod error;
pub mod summary;
pub mod text;
pub mod types;
pub mod zone;

pub use error::{ParseError, ParseResult};
pub use summary::{AnalysisSummary, Trend};
pub use types::{
    Address, AirQualityIndex, IndexLevel, MAX_INDEX_LEVEL, Parameter, Provenance, Sample, Sensor,
    SensorId, Station, StationId, SubIndex,
};
pub use zone::SourceZone;
