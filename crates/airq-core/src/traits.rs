//! Trait seams between the controller and its collaborators.
//!
//! [`RemoteSource`] abstracts over the real HTTP client and
//! [`MockSource`](crate::MockSource); [`SeriesRepository`] and
//! [`CatalogRepository`] abstract over local persistence.

use async_trait::async_trait;
use time::OffsetDateTime;

use airq_types::{AirQualityIndex, Sample, Sensor, SensorId, Station, StationId};

use crate::client::RemoteResult;

/// A provider of remote air-quality data.
///
/// Implementations make one attempt per call and never write locally.
///
/// # Example
///
/// ```ignore
/// use airq_core::{RemoteSource, client::RemoteResult};
///
/// async fn count_samples<S: RemoteSource>(source: &S) -> RemoteResult<usize> {
///     Ok(source.fetch_series(92).await?.len())
/// }
/// ```
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// All measuring stations.
    async fn fetch_stations(&self) -> RemoteResult<Vec<Station>>;

    /// Measuring posts of a station.
    async fn fetch_sensors(&self, station_id: StationId) -> RemoteResult<Vec<Sensor>>;

    /// Recent samples of a sensor in ascending timestamp order.
    async fn fetch_series(&self, sensor_id: SensorId) -> RemoteResult<Vec<Sample>>;

    /// Current index of a station.
    async fn fetch_index(&self, station_id: StationId) -> RemoteResult<AirQualityIndex>;
}

/// Durable, bounded storage of per-sensor series.
#[async_trait]
pub trait SeriesRepository: Send + Sync {
    /// Insert or overwrite samples; returns how many rows changed.
    async fn upsert(&self, sensor_id: SensorId, samples: &[Sample]) -> airq_store::Result<usize>;

    /// Samples with `since <= timestamp <= until`, oldest first.
    async fn query(
        &self,
        sensor_id: SensorId,
        since: OffsetDateTime,
        until: OffsetDateTime,
    ) -> airq_store::Result<Vec<Sample>>;

    /// Newest stored timestamp, if any.
    async fn latest_timestamp(
        &self,
        sensor_id: SensorId,
    ) -> airq_store::Result<Option<OffsetDateTime>>;

    /// Drop samples older than `retention_hours` before the newest one.
    async fn prune(&self, sensor_id: SensorId, retention_hours: u32) -> airq_store::Result<usize>;
}

/// Cached station catalog and index snapshots.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert or refresh stations.
    async fn save_stations(&self, stations: &[Station]) -> airq_store::Result<usize>;

    /// All cached stations.
    async fn stations(&self) -> airq_store::Result<Vec<Station>>;

    /// Insert or refresh sensors.
    async fn save_sensors(&self, sensors: &[Sensor]) -> airq_store::Result<usize>;

    /// Cached sensors of a station.
    async fn sensors(&self, station_id: StationId) -> airq_store::Result<Vec<Sensor>>;

    /// Store an index snapshot; `false` when it was already known.
    async fn save_index(&self, index: &AirQualityIndex) -> airq_store::Result<bool>;

    /// Most recent stored index of a station.
    async fn latest_index(
        &self,
        station_id: StationId,
    ) -> airq_store::Result<Option<AirQualityIndex>>;
}
