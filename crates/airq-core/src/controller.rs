//! Remote-first data sourcing with cached fallback.
//!
//! The [`ResilienceController`] is the single place that decides between
//! live and cached data. Every call makes at most one remote attempt,
//! bounded by the request timeout. On success the result is written to the
//! repository and returned as [`Provenance::Live`]; on failure the repository
//! answers and the result is tagged [`Provenance::Cached`].
//!
//! # Example
//!
//! ```no_run
//! use airq_core::{Config, GiosClient, ResilienceController, SqliteRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_default()?;
//! let client = GiosClient::new(&config.remote_base_url, config.request_timeout())?;
//! let repository = SqliteRepository::open(&config.storage.path)?;
//! let controller = ResilienceController::from_config(client, repository, &config);
//!
//! let series = controller.current_series(92).await?;
//! println!("{} samples ({})", series.data.len(), series.provenance);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use airq_types::{
    AirQualityIndex, AnalysisSummary, Provenance, Sample, Sensor, SensorId, Station, StationId,
};

use crate::analysis::{self, DEFAULT_TREND_EPSILON};
use crate::client::{RemoteError, RemoteResult};
use crate::config::{Config, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RETENTION_HOURS};
use crate::error::{Error, Result};
use crate::locks::SensorLocks;
use crate::traits::{CatalogRepository, RemoteSource, SeriesRepository};

/// Data tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    /// The payload.
    pub data: T,
    /// Whether it came from the remote service or the local cache.
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    /// Data fetched from the remote service.
    pub fn live(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Live,
        }
    }

    /// Data read from the local cache.
    pub fn cached(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Cached,
        }
    }

    /// Whether the data is live.
    pub fn is_live(&self) -> bool {
        self.provenance == Provenance::Live
    }

    /// Transform the payload, keeping the provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            data: f(self.data),
            provenance: self.provenance,
        }
    }
}

/// Policy point between a [`RemoteSource`] and a local repository.
pub struct ResilienceController<S, R> {
    source: S,
    repository: R,
    locks: SensorLocks,
    retention_hours: u32,
    request_timeout: Duration,
    trend_epsilon: f64,
}

impl<S, R> ResilienceController<S, R>
where
    S: RemoteSource,
    R: SeriesRepository + CatalogRepository,
{
    /// Create a controller with default retention, timeout and epsilon.
    pub fn new(source: S, repository: R) -> Self {
        Self {
            source,
            repository,
            locks: SensorLocks::new(),
            retention_hours: DEFAULT_RETENTION_HOURS,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            trend_epsilon: DEFAULT_TREND_EPSILON,
        }
    }

    /// Create a controller using the settings in `config`.
    pub fn from_config(source: S, repository: R, config: &Config) -> Self {
        Self::new(source, repository)
            .retention_hours(config.retention_hours)
            .request_timeout(config.request_timeout())
            .trend_epsilon(config.trend_epsilon)
    }

    /// Set the retention window.
    #[must_use]
    pub fn retention_hours(mut self, hours: u32) -> Self {
        self.retention_hours = hours;
        self
    }

    /// Set the upper bound for one remote attempt.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the flat-trend threshold used by [`Self::analyze`].
    #[must_use]
    pub fn trend_epsilon(mut self, epsilon: f64) -> Self {
        self.trend_epsilon = epsilon;
        self
    }

    /// The remote source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Configured retention window in hours.
    pub fn retention(&self) -> u32 {
        self.retention_hours
    }

    /// Current series of a sensor, live if possible.
    ///
    /// A live result is stored and the sensor's history pruned before
    /// returning. When the remote attempt fails, the cached samples of the
    /// last retention window are returned instead; with nothing cached the
    /// call fails with [`Error::NoDataAvailable`].
    ///
    /// Calls for the same sensor run one at a time.
    pub async fn current_series(&self, sensor_id: SensorId) -> Result<Sourced<Vec<Sample>>> {
        let _guard = self.locks.lock(sensor_id).await;

        let operation = format!("data/getData/{sensor_id}");
        match self
            .attempt(&operation, self.source.fetch_series(sensor_id))
            .await
        {
            Ok(samples) => {
                let previous = self.repository.latest_timestamp(sensor_id).await?;
                let written = self.repository.upsert(sensor_id, &samples).await?;
                let pruned = self
                    .repository
                    .prune(sensor_id, self.retention_hours)
                    .await?;

                let newer = match previous {
                    Some(latest) => samples.iter().filter(|s| s.timestamp > latest).count(),
                    None => samples.len(),
                };
                info!(
                    "Sensor {}: fetched {} samples ({} new, {} written, {} pruned)",
                    sensor_id,
                    samples.len(),
                    newer,
                    written,
                    pruned
                );

                Ok(Sourced::live(samples))
            }
            Err(e) => {
                warn!("Remote fetch for sensor {} failed: {}", sensor_id, e);
                let cached = self
                    .query_history(sensor_id, self.retention_hours)
                    .await?;

                if cached.is_empty() {
                    Err(Error::no_data(format!("sensor {sensor_id}")))
                } else {
                    info!(
                        "Serving {} cached samples for sensor {}",
                        cached.len(),
                        sensor_id
                    );
                    Ok(Sourced::cached(cached))
                }
            }
        }
    }

    /// Cached samples of the last `since_hours` hours, oldest first.
    ///
    /// Never contacts the remote service. A window reaching before the Unix
    /// epoch starts at the epoch.
    pub async fn query_history(&self, sensor_id: SensorId, since_hours: u32) -> Result<Vec<Sample>> {
        let until = OffsetDateTime::now_utc();
        let since = until
            .checked_sub(time::Duration::hours(i64::from(since_hours)))
            .map_or(OffsetDateTime::UNIX_EPOCH, |since| {
                since.max(OffsetDateTime::UNIX_EPOCH)
            });
        debug!(
            "Querying sensor {} history from {} to {}",
            sensor_id, since, until
        );
        Ok(self.repository.query(sensor_id, since, until).await?)
    }

    /// Summary of the cached samples of the last `since_hours` hours.
    pub async fn analyze(&self, sensor_id: SensorId, since_hours: u32) -> Result<AnalysisSummary> {
        let samples = self.query_history(sensor_id, since_hours).await?;
        Ok(self.summarize(&samples))
    }

    /// Summary of `samples` with the configured trend epsilon.
    pub fn summarize(&self, samples: &[Sample]) -> AnalysisSummary {
        analysis::summarize(samples, self.trend_epsilon)
    }

    /// All stations, live if possible.
    pub async fn stations(&self) -> Result<Sourced<Vec<Station>>> {
        match self
            .attempt("station/findAll", self.source.fetch_stations())
            .await
        {
            Ok(stations) => {
                self.repository.save_stations(&stations).await?;
                Ok(Sourced::live(stations))
            }
            Err(e) => {
                warn!("Remote station list failed: {}", e);
                let cached = self.repository.stations().await?;
                if cached.is_empty() {
                    Err(Error::no_data("station list"))
                } else {
                    Ok(Sourced::cached(cached))
                }
            }
        }
    }

    /// Sensors of a station, live if possible.
    pub async fn sensors(&self, station_id: StationId) -> Result<Sourced<Vec<Sensor>>> {
        let operation = format!("station/sensors/{station_id}");
        match self
            .attempt(&operation, self.source.fetch_sensors(station_id))
            .await
        {
            Ok(sensors) => {
                self.repository.save_sensors(&sensors).await?;
                Ok(Sourced::live(sensors))
            }
            Err(e) => {
                warn!("Remote sensor list for station {} failed: {}", station_id, e);
                let cached = self.repository.sensors(station_id).await?;
                if cached.is_empty() {
                    Err(Error::no_data(format!("sensors of station {station_id}")))
                } else {
                    Ok(Sourced::cached(cached))
                }
            }
        }
    }

    /// Air-quality index of a station, live if possible.
    pub async fn index(&self, station_id: StationId) -> Result<Sourced<AirQualityIndex>> {
        let operation = format!("aqindex/getIndex/{station_id}");
        match self
            .attempt(&operation, self.source.fetch_index(station_id))
            .await
        {
            Ok(index) => {
                self.repository.save_index(&index).await?;
                Ok(Sourced::live(index))
            }
            Err(e) => {
                warn!("Remote index for station {} failed: {}", station_id, e);
                self.repository
                    .latest_index(station_id)
                    .await?
                    .map(Sourced::cached)
                    .ok_or_else(|| Error::no_data(format!("index of station {station_id}")))
            }
        }
    }

    /// Run one remote attempt under the request timeout.
    async fn attempt<T>(
        &self,
        operation: &str,
        fetch: impl Future<Output = RemoteResult<T>>,
    ) -> RemoteResult<T> {
        match tokio::time::timeout(self.request_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout {
                operation: operation.to_string(),
                duration: self.request_timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use airq_types::{IndexLevel, Parameter};

    use crate::mock::MockSource;
    use crate::repository::SqliteRepository;

    type TestController = ResilienceController<MockSource, SqliteRepository>;

    fn controller() -> TestController {
        ResilienceController::new(MockSource::new(), SqliteRepository::in_memory().unwrap())
    }

    /// `count` hourly samples ending at the current hour.
    fn recent_series(sensor_id: SensorId, count: i64) -> Vec<Sample> {
        let now = OffsetDateTime::now_utc()
            .replace_nanosecond(0)
            .unwrap()
            .replace_second(0)
            .unwrap()
            .replace_minute(0)
            .unwrap();
        (0..count)
            .map(|i| {
                Sample::new(
                    sensor_id,
                    now - time::Duration::hours(count - 1 - i),
                    10.0 + i as f64,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_live_series_is_stored_and_tagged() {
        let controller = controller();
        let samples = recent_series(92, 5);
        controller.source().set_series(92, samples.clone()).await;

        let result = controller.current_series(92).await.unwrap();
        assert_eq!(result.provenance, Provenance::Live);
        assert_eq!(result.data, samples);

        let stored = controller.query_history(92, 15).await.unwrap();
        assert_eq!(stored, samples);
    }

    #[tokio::test]
    async fn test_fallback_serves_cache() {
        let controller = controller();
        controller.source().set_series(92, recent_series(92, 3)).await;
        controller.current_series(92).await.unwrap();

        controller.source().set_should_fail(true);
        let result = controller.current_series(92).await.unwrap();
        assert_eq!(result.provenance, Provenance::Cached);
        assert_eq!(result.data.len(), 3);
        assert!(!result.is_live());
    }

    #[tokio::test]
    async fn test_fallback_without_cache_is_no_data() {
        let controller = controller();
        controller.source().set_should_fail(true);

        let err = controller.current_series(92).await.unwrap_err();
        assert!(matches!(err, Error::NoDataAvailable { .. }));
    }

    #[tokio::test]
    async fn test_fallback_ignores_samples_outside_window() {
        let controller = controller();
        let stale: Vec<Sample> = recent_series(92, 1)
            .into_iter()
            .map(|s| Sample {
                timestamp: s.timestamp - time::Duration::hours(48),
                ..s
            })
            .collect();
        controller.repository().upsert(92, &stale).await.unwrap();

        controller.source().set_should_fail(true);
        let err = controller.current_series(92).await.unwrap_err();
        assert!(matches!(err, Error::NoDataAvailable { .. }));
    }

    #[tokio::test]
    async fn test_live_fetch_prunes_beyond_retention() {
        let controller = controller().retention_hours(4);
        controller.source().set_series(92, recent_series(92, 10)).await;

        controller.current_series(92).await.unwrap();

        let store = controller.repository().store().await;
        let (oldest, newest) = store.sample_range(92).unwrap().unwrap();
        assert!(newest - oldest <= time::Duration::hours(4));
        assert_eq!(store.count_samples(Some(92)).unwrap(), 5);
    }

    #[tokio::test]
    async fn test_exactly_one_attempt_per_call() {
        let controller = controller();
        controller.source().set_should_fail(true);

        let _ = controller.current_series(92).await;
        assert_eq!(controller.source().call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_unavailable_and_writes_nothing() {
        let controller = controller().request_timeout(Duration::from_millis(100));
        controller.source().set_series(92, recent_series(92, 3)).await;
        controller.source().set_latency(Duration::from_secs(10));

        let err = controller.current_series(92).await.unwrap_err();
        assert!(matches!(err, Error::NoDataAvailable { .. }));

        let store = controller.repository().store().await;
        assert_eq!(store.count_samples(Some(92)).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_calls_for_one_sensor() {
        let controller = Arc::new(controller());
        controller.source().set_series(92, recent_series(92, 6)).await;

        let handles = (0..4).map(|_| {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.current_series(92).await })
        });

        for result in futures::future::join_all(handles).await {
            assert!(result.unwrap().unwrap().is_live());
        }
        let store = controller.repository().store().await;
        assert_eq!(store.count_samples(Some(92)).unwrap(), 6);
    }

    #[tokio::test]
    async fn test_analyze_uses_cache_only() {
        let controller = controller();
        controller.source().set_series(92, recent_series(92, 5)).await;
        controller.current_series(92).await.unwrap();

        controller.source().set_should_fail(true);
        let calls = controller.source().call_count();
        let summary = controller.analyze(92, 15).await.unwrap();

        assert_eq!(controller.source().call_count(), calls);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.mean, Some(12.0));
        assert_eq!(summary.trend, Some(airq_types::Trend::Rising));
    }

    #[tokio::test]
    async fn test_summarize_matches_analyze_for_one_window() {
        let controller = controller().trend_epsilon(0.5);
        controller.source().set_series(92, recent_series(92, 6)).await;
        controller.current_series(92).await.unwrap();

        let samples = controller.query_history(92, 15).await.unwrap();
        let summary = controller.summarize(&samples);
        assert_eq!(summary, controller.analyze(92, 15).await.unwrap());
        assert_eq!(summary.count, samples.len());
        assert_eq!(summary.trend, Some(airq_types::Trend::Rising));
    }

    #[tokio::test]
    async fn test_query_history_window_beyond_epoch() {
        let controller = controller();
        controller.source().set_series(92, recent_series(92, 3)).await;
        controller.current_series(92).await.unwrap();

        let all = controller.query_history(92, u32::MAX).await.unwrap();
        assert_eq!(all.len(), 3);
        let summary = controller.analyze(92, u32::MAX).await.unwrap();
        assert_eq!(summary.count, 3);
    }

    #[tokio::test]
    async fn test_hourly_buckets_agree_live_and_cached() {
        let zone = airq_types::SourceZone::WARSAW;
        let local: Vec<Sample> = recent_series(92, 4)
            .into_iter()
            .map(|s| Sample {
                timestamp: zone.localize(s.timestamp),
                ..s
            })
            .collect();
        let controller = controller();
        controller.source().set_series(92, local).await;

        let live = controller.current_series(92).await.unwrap();
        controller.source().set_should_fail(true);
        let cached = controller.current_series(92).await.unwrap();
        assert!(!cached.is_live());

        let live_hours = analysis::hourly_averages(&live.data, zone);
        let cached_hours = analysis::hourly_averages(&cached.data, zone);
        assert_eq!(live_hours.len(), 4);
        assert_eq!(live_hours, cached_hours);
    }

    #[tokio::test]
    async fn test_query_history_unknown_sensor_is_empty() {
        let controller = controller();
        assert!(controller.query_history(1, 15).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_fallback() {
        let controller = controller();
        let station = Station {
            id: 52,
            name: "Kraków, Aleja Krasińskiego".to_string(),
            latitude: None,
            longitude: None,
            address: Default::default(),
        };
        let sensor = Sensor {
            id: 16784,
            station_id: 52,
            parameter: Parameter {
                id: Some(3),
                name: "pył zawieszony PM10".to_string(),
                formula: "PM10".to_string(),
                code: "PM10".to_string(),
            },
        };
        controller.source().set_stations(vec![station.clone()]).await;
        controller.source().set_sensors(52, vec![sensor.clone()]).await;

        assert!(controller.stations().await.unwrap().is_live());
        assert!(controller.sensors(52).await.unwrap().is_live());

        controller.source().set_should_fail(true);
        let stations = controller.stations().await.unwrap();
        assert_eq!(stations, Sourced::cached(vec![station]));
        let sensors = controller.sensors(52).await.unwrap();
        assert_eq!(sensors, Sourced::cached(vec![sensor]));

        assert!(matches!(
            controller.sensors(1).await.unwrap_err(),
            Error::NoDataAvailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_index_fallback() {
        let controller = controller();
        let index = AirQualityIndex {
            station_id: 52,
            calculated_at: time::macros::datetime!(2024-03-01 12:20 UTC),
            level: Some(IndexLevel::new(2, "Umiarkowany").unwrap()),
            sub_indices: Vec::new(),
            source_data_at: None,
        };

        controller.source().set_should_fail(true);
        assert!(controller.index(52).await.is_err());

        controller.source().set_should_fail(false);
        controller.source().set_index(index.clone()).await;
        assert!(controller.index(52).await.unwrap().is_live());

        controller.source().set_should_fail(true);
        assert_eq!(controller.index(52).await.unwrap(), Sourced::cached(index));
    }

    #[test]
    fn test_sourced_map_keeps_provenance() {
        let sourced = Sourced::cached(vec![1, 2, 3]).map(|v| v.len());
        assert_eq!(sourced.data, 3);
        assert_eq!(sourced.provenance, Provenance::Cached);
    }
}
