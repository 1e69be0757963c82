//! Mock remote source for testing.
//!
//! The [`MockSource`] implements the [`RemoteSource`] trait, allowing it to be
//! used interchangeably with [`GiosClient`](crate::GiosClient) in generic code.
//!
//! # Features
//!
//! - **Failure injection**: fail every call, or only the next few
//! - **Latency simulation**: delay every response to exercise timeouts
//! - **Call counting**: verify how many remote attempts were made

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use airq_types::{AirQualityIndex, Sample, Sensor, SensorId, Station, StationId};

use crate::client::{RemoteError, RemoteResult};
use crate::traits::RemoteSource;

/// A scripted remote source for testing.
///
/// # Example
///
/// ```
/// use airq_core::{MockSource, RemoteSource};
/// use airq_types::Sample;
/// use time::OffsetDateTime;
///
/// #[tokio::main]
/// async fn main() {
///     let source = MockSource::new();
///     source
///         .set_series(92, vec![Sample::new(92, OffsetDateTime::now_utc(), 12.0)])
///         .await;
///
///     assert_eq!(source.fetch_series(92).await.unwrap().len(), 1);
///
///     source.set_should_fail(true);
///     assert!(source.fetch_series(92).await.is_err());
/// }
/// ```
#[derive(Default)]
pub struct MockSource {
    stations: RwLock<Vec<Station>>,
    sensors: RwLock<HashMap<StationId, Vec<Sensor>>>,
    series: RwLock<HashMap<SensorId, Vec<Sample>>>,
    indices: RwLock<HashMap<StationId, AirQualityIndex>>,
    should_fail: AtomicBool,
    /// Simulated response latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    /// Number of calls to fail before succeeding again.
    remaining_failures: AtomicU32,
    call_count: AtomicU32,
}

impl std::fmt::Debug for MockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSource")
            .field("should_fail", &self.should_fail.load(Ordering::Relaxed))
            .field("latency_ms", &self.latency_ms.load(Ordering::Relaxed))
            .field("call_count", &self.call_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl MockSource {
    /// Create an empty mock that answers every call successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the station list.
    pub async fn set_stations(&self, stations: Vec<Station>) {
        *self.stations.write().await = stations;
    }

    /// Script the sensors of a station.
    pub async fn set_sensors(&self, station_id: StationId, sensors: Vec<Sensor>) {
        self.sensors.write().await.insert(station_id, sensors);
    }

    /// Script the series of a sensor.
    pub async fn set_series(&self, sensor_id: SensorId, samples: Vec<Sample>) {
        self.series.write().await.insert(sensor_id, samples);
    }

    /// Script the index of a station.
    pub async fn set_index(&self, index: AirQualityIndex) {
        self.indices.write().await.insert(index.station_id, index);
    }

    /// Make every call fail (or succeed again).
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// Fail the next `count` calls, then behave normally.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of remote calls made so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    async fn check_should_fail(&self, operation: &str) -> RemoteResult<()> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        // Check for transient failures first
        let transient = self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();

        if transient || self.should_fail.load(Ordering::Relaxed) {
            Err(RemoteError::Status {
                url: format!("mock://{operation}"),
                status: 503,
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteSource for MockSource {
    async fn fetch_stations(&self) -> RemoteResult<Vec<Station>> {
        self.check_should_fail("station/findAll").await?;
        Ok(self.stations.read().await.clone())
    }

    async fn fetch_sensors(&self, station_id: StationId) -> RemoteResult<Vec<Sensor>> {
        self.check_should_fail(&format!("station/sensors/{station_id}"))
            .await?;
        Ok(self
            .sensors
            .read()
            .await
            .get(&station_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_series(&self, sensor_id: SensorId) -> RemoteResult<Vec<Sample>> {
        self.check_should_fail(&format!("data/getData/{sensor_id}"))
            .await?;
        Ok(self
            .series
            .read()
            .await
            .get(&sensor_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_index(&self, station_id: StationId) -> RemoteResult<AirQualityIndex> {
        let operation = format!("aqindex/getIndex/{station_id}");
        self.check_should_fail(&operation).await?;
        self.indices
            .read()
            .await
            .get(&station_id)
            .cloned()
            .ok_or(RemoteError::Status {
                url: format!("mock://{operation}"),
                status: 404,
            })
    }
}
