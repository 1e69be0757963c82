//! Data models for stored data.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use airq_types::SensorId;

/// Summary of one sensor's cached series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesInfo {
    /// Sensor identifier.
    pub sensor_id: SensorId,
    /// Number of stored samples, absent slots included.
    pub sample_count: u64,
    /// Oldest stored timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub oldest: OffsetDateTime,
    /// Newest stored timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub newest: OffsetDateTime,
    /// When the series was last written.
    #[serde(with = "time::serde::rfc3339")]
    pub last_synced_at: OffsetDateTime,
}
