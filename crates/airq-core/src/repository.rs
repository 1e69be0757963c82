//! SQLite-backed repository.
//!
//! Wraps an [`airq_store::Store`] in an async mutex so a single connection
//! serves every task. Each call holds the lock for one store operation.

use std::path::Path;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};

use airq_store::{SampleQuery, Store};
use airq_types::{AirQualityIndex, Sample, Sensor, SensorId, Station, StationId};

use crate::traits::{CatalogRepository, SeriesRepository};

/// Repository over a local SQLite database.
pub struct SqliteRepository {
    store: Mutex<Store>,
}

impl SqliteRepository {
    /// Wrap an already opened store.
    pub fn new(store: Store) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> airq_store::Result<Self> {
        Store::open(path).map(Self::new)
    }

    /// Repository over an in-memory database.
    pub fn in_memory() -> airq_store::Result<Self> {
        Store::open_in_memory().map(Self::new)
    }

    /// Direct access to the underlying store.
    pub async fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().await
    }
}

#[async_trait]
impl SeriesRepository for SqliteRepository {
    async fn upsert(&self, sensor_id: SensorId, samples: &[Sample]) -> airq_store::Result<usize> {
        self.store.lock().await.upsert_samples(sensor_id, samples)
    }

    async fn query(
        &self,
        sensor_id: SensorId,
        since: OffsetDateTime,
        until: OffsetDateTime,
    ) -> airq_store::Result<Vec<Sample>> {
        let query = SampleQuery::new(sensor_id).since(since).until(until);
        self.store.lock().await.query_samples(&query)
    }

    async fn latest_timestamp(
        &self,
        sensor_id: SensorId,
    ) -> airq_store::Result<Option<OffsetDateTime>> {
        self.store.lock().await.latest_timestamp(sensor_id)
    }

    async fn prune(&self, sensor_id: SensorId, retention_hours: u32) -> airq_store::Result<usize> {
        self.store
            .lock()
            .await
            .prune_samples(sensor_id, retention_hours)
    }
}

#[async_trait]
impl CatalogRepository for SqliteRepository {
    async fn save_stations(&self, stations: &[Station]) -> airq_store::Result<usize> {
        self.store.lock().await.upsert_stations(stations)
    }

    async fn stations(&self) -> airq_store::Result<Vec<Station>> {
        self.store.lock().await.list_stations()
    }

    async fn save_sensors(&self, sensors: &[Sensor]) -> airq_store::Result<usize> {
        self.store.lock().await.upsert_sensors(sensors)
    }

    async fn sensors(&self, station_id: StationId) -> airq_store::Result<Vec<Sensor>> {
        self.store.lock().await.list_sensors(station_id)
    }

    async fn save_index(&self, index: &AirQualityIndex) -> airq_store::Result<bool> {
        self.store.lock().await.insert_index(index)
    }

    async fn latest_index(
        &self,
        station_id: StationId,
    ) -> airq_store::Result<Option<AirQualityIndex>> {
        self.store.lock().await.latest_index(station_id)
    }
}
