//! Pipeline configuration.
//!
//! Loaded from `<config_dir>/airq/config.toml`; every key is optional.
//!
//! ```toml
//! remote_base_url = "https://api.gios.gov.pl/pjp-api/v1/rest"
//! retention_hours = 15
//! request_timeout_ms = 30000
//! trend_epsilon = 0.1
//! source_timezone = "Europe/Warsaw"
//!
//! [storage]
//! path = "/var/lib/airq/data.db"
//! ```
//!
//! Top-level keys are also accepted in camelCase (`remoteBaseUrl`, ...).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use airq_types::SourceZone;

use crate::analysis::DEFAULT_TREND_EPSILON;
use crate::client::GiosClient;

/// Default retention window in hours.
pub const DEFAULT_RETENTION_HOURS: u32 = 15;

/// Default request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Longest accepted request timeout (5 minutes).
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;

/// Longest accepted retention window (one year).
pub const MAX_RETENTION_HOURS: u32 = 24 * 366;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root URL of the remote REST service.
    #[serde(alias = "remoteBaseUrl")]
    pub remote_base_url: String,
    /// How many hours of history to keep per sensor.
    #[serde(alias = "retentionHours")]
    pub retention_hours: u32,
    /// Upper bound for one remote call, in milliseconds.
    #[serde(alias = "requestTimeoutMs")]
    pub request_timeout_ms: u64,
    /// Slope magnitude below which a trend is flat.
    #[serde(alias = "trendEpsilon")]
    pub trend_epsilon: f64,
    /// Zone of the naive timestamps the service publishes: an IANA name
    /// such as `Europe/Warsaw` or a fixed offset such as `+01:00`.
    #[serde(alias = "sourceTimezone")]
    pub source_timezone: String,
    /// Storage settings.
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_base_url: GiosClient::DEFAULT_BASE_URL.to_string(),
            retention_hours: DEFAULT_RETENTION_HOURS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            trend_epsilon: DEFAULT_TREND_EPSILON,
            source_timezone: SourceZone::WARSAW.to_string(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - The base URL is an http(s) URL
    /// - The retention window is between one hour and one year
    /// - The request timeout is positive and at most five minutes
    /// - The trend epsilon is finite and non-negative
    /// - The source time zone resolves
    /// - The storage path is not empty
    ///
    /// # Example
    ///
    /// ```
    /// use airq_core::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !self.remote_base_url.starts_with("http://")
            && !self.remote_base_url.starts_with("https://")
        {
            errors.push(ValidationError {
                field: "remote_base_url".to_string(),
                message: format!(
                    "'{}' must start with http:// or https://",
                    self.remote_base_url
                ),
            });
        }

        if self.retention_hours == 0 {
            errors.push(ValidationError {
                field: "retention_hours".to_string(),
                message: "retention window must be at least 1 hour".to_string(),
            });
        } else if self.retention_hours > MAX_RETENTION_HOURS {
            errors.push(ValidationError {
                field: "retention_hours".to_string(),
                message: format!(
                    "retention window {} is too long (maximum {} hours)",
                    self.retention_hours, MAX_RETENTION_HOURS
                ),
            });
        }

        if self.request_timeout_ms == 0 {
            errors.push(ValidationError {
                field: "request_timeout_ms".to_string(),
                message: "request timeout cannot be 0".to_string(),
            });
        } else if self.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
            errors.push(ValidationError {
                field: "request_timeout_ms".to_string(),
                message: format!(
                    "request timeout {} is too long (maximum {} ms)",
                    self.request_timeout_ms, MAX_REQUEST_TIMEOUT_MS
                ),
            });
        }

        if !self.trend_epsilon.is_finite() || self.trend_epsilon < 0.0 {
            errors.push(ValidationError {
                field: "trend_epsilon".to_string(),
                message: format!(
                    "trend epsilon {} must be a non-negative number",
                    self.trend_epsilon
                ),
            });
        }

        if let Err(e) = self.source_zone() {
            errors.push(ValidationError {
                field: "source_timezone".to_string(),
                message: e.to_string(),
            });
        }

        errors.extend(self.storage.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// The request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The configured source zone.
    pub fn source_zone(&self) -> Result<SourceZone, airq_types::ParseError> {
        self.source_timezone.parse()
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: airq_store::default_db_path(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.path".to_string(),
                message: "database path cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::InvalidConfig(err.to_string())
    }
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path (e.g., `storage.path`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("airq")
        .join("config.toml")
}
