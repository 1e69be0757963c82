//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use airq_types::{SensorId, StationId};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Settings that override the configuration file
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "AIRQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file
    #[arg(long, global = true, env = "AIRQ_DB")]
    pub db: Option<PathBuf>,

    /// Root URL of the remote REST service
    #[arg(long, global = true, env = "AIRQ_BASE_URL")]
    pub base_url: Option<String>,

    /// Upper bound for one remote call, in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Hours of history kept per sensor
    #[arg(long, global = true)]
    pub retention_hours: Option<u32>,
}

#[derive(Parser)]
#[command(name = "airq")]
#[command(author, version, about = "Air-quality data from GIOŚ stations, with offline fallback", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List measuring stations
    Stations {
        /// Only stations whose city contains this text
        #[arg(short, long)]
        city: Option<String>,
    },

    /// List the sensors of a station
    Sensors {
        /// Station identifier
        station: StationId,
    },

    /// Fetch the current series of a sensor (cached if the service is down)
    Fetch {
        /// Sensor identifier
        sensor: SensorId,
    },

    /// Show cached history of a sensor without contacting the service
    History {
        /// Sensor identifier
        sensor: SensorId,

        /// Hours back from now (defaults to the retention window)
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Summarize cached history of a sensor
    Analyze {
        /// Sensor identifier
        sensor: SensorId,

        /// Hours back from now (defaults to the retention window)
        #[arg(long)]
        hours: Option<u32>,

        /// Also list samples far from the mean
        #[arg(long)]
        anomalies: bool,

        /// Z-score above which a sample is reported as an anomaly
        #[arg(long, default_value_t = airq_core::analysis::DEFAULT_ANOMALY_THRESHOLD)]
        threshold: f64,

        /// Also show mean values per hour of day
        #[arg(long)]
        hourly: bool,
    },

    /// Show the current air-quality index of a station
    Index {
        /// Station identifier
        station: StationId,
    },

    /// Poll sensors continuously
    Watch {
        /// Sensor identifiers, comma-separated or repeated
        #[arg(required = true, value_delimiter = ',')]
        sensors: Vec<SensorId>,

        /// Seconds between polls
        #[arg(short, long, default_value = "600")]
        interval: u64,

        /// Stop after this many events (0 runs until interrupted)
        #[arg(short = 'n', long, default_value = "0")]
        count: u32,
    },

    /// Inspect the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show database location and cached series
    Info,

    /// Show the oldest and newest cached sample of a sensor
    Range {
        /// Sensor identifier
        sensor: SensorId,
    },

    /// Export cached samples as CSV
    Export {
        /// Sensor identifier
        sensor: SensorId,

        /// Hours back from now (all cached samples when omitted)
        #[arg(long)]
        hours: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a configuration file with the effective settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
