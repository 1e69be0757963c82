//! HTTP client for the GIOŚ REST API.
//!
//! The client performs exactly one GET per call and translates the payload
//! through [`crate::wire`]. It never retries and never touches local storage.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use airq_core::client::GiosClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GiosClient::new(GiosClient::DEFAULT_BASE_URL, Duration::from_secs(30))?;
//!
//! let stations = client.stations().await?;
//! println!("{} stations", stations.len());
//!
//! let series = client.series(92).await?;
//! println!("{} samples", series.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use airq_types::{AirQualityIndex, Sample, Sensor, SensorId, SourceZone, Station, StationId};

use crate::traits::RemoteSource;
use crate::wire;

/// Error type for remote operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The service is not reachable.
    #[error("Service not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The payload could not be translated.
    #[error("Malformed response from {url}: {message}")]
    Malformed { url: String, message: String },

    /// The request did not complete in time.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Result type for remote operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// HTTP client for the GIOŚ air-quality service.
#[derive(Debug, Clone)]
pub struct GiosClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    source_zone: SourceZone,
}

impl GiosClient {
    /// Public v1 endpoint of the service.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.gios.gov.pl/pjp-api/v1/rest";

    /// Zone the service publishes naive timestamps in.
    pub const DEFAULT_SOURCE_ZONE: SourceZone = SourceZone::WARSAW;

    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the REST API, e.g. `https://api.gios.gov.pl/pjp-api/v1/rest`
    /// * `timeout` - Upper bound for each request, connect and body included
    pub fn new(base_url: &str, timeout: Duration) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("airq/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::Client)?;

        Self::with_client(base_url, client, timeout)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client, timeout: Duration) -> RemoteResult<Self> {
        // Normalize URL (remove trailing slash)
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(RemoteError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            timeout,
            source_zone: Self::DEFAULT_SOURCE_ZONE,
        })
    }

    /// Interpret naive wire timestamps in this zone.
    #[must_use]
    pub fn with_source_zone(mut self, zone: SourceZone) -> Self {
        self.source_zone = zone;
        self
    }

    /// Zone naive wire timestamps are read in.
    pub fn source_zone(&self) -> SourceZone {
        self.source_zone
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// All measuring stations.
    pub async fn stations(&self) -> RemoteResult<Vec<Station>> {
        let (url, body) = self.get("station/findAll").await?;
        wire::parse_stations(&body).map_err(|e| malformed(&url, e))
    }

    /// Measuring posts of one station.
    pub async fn sensors(&self, station_id: StationId) -> RemoteResult<Vec<Sensor>> {
        let (url, body) = self.get(&format!("station/sensors/{station_id}")).await?;
        wire::parse_sensors(&body, station_id).map_err(|e| malformed(&url, e))
    }

    /// Recent measurements of one sensor, oldest first.
    pub async fn series(&self, sensor_id: SensorId) -> RemoteResult<Vec<Sample>> {
        let (url, body) = self.get(&format!("data/getData/{sensor_id}")).await?;
        wire::parse_series(&body, sensor_id, self.source_zone).map_err(|e| malformed(&url, e))
    }

    /// Current air-quality index of one station.
    pub async fn index(&self, station_id: StationId) -> RemoteResult<AirQualityIndex> {
        let (url, body) = self.get(&format!("aqindex/getIndex/{station_id}")).await?;
        wire::parse_index(&body, station_id, self.source_zone).map_err(|e| malformed(&url, e))
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn get(&self, path: &str) -> RemoteResult<(String, Value)> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(path, &url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(path, &url, e))?;

        let body = serde_json::from_str(&text).map_err(|e| RemoteError::Malformed {
            url: url.clone(),
            message: format!("invalid JSON: {e}"),
        })?;

        Ok((url, body))
    }

    fn transport_error(&self, path: &str, url: &str, source: reqwest::Error) -> RemoteError {
        if source.is_timeout() {
            RemoteError::Timeout {
                operation: path.to_string(),
                duration: self.timeout,
            }
        } else {
            RemoteError::NotReachable {
                url: url.to_string(),
                source,
            }
        }
    }
}

fn malformed(url: &str, error: wire::WireError) -> RemoteError {
    RemoteError::Malformed {
        url: url.to_string(),
        message: error.to_string(),
    }
}

#[async_trait]
impl RemoteSource for GiosClient {
    async fn fetch_stations(&self) -> RemoteResult<Vec<Station>> {
        self.stations().await
    }

    async fn fetch_sensors(&self, station_id: StationId) -> RemoteResult<Vec<Sensor>> {
        self.sensors(station_id).await
    }

    async fn fetch_series(&self, sensor_id: SensorId) -> RemoteResult<Vec<Sample>> {
        self.series(sensor_id).await
    }

    async fn fetch_index(&self, station_id: StationId) -> RemoteResult<AirQualityIndex> {
        self.index(station_id).await
    }
}
