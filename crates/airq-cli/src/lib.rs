//! Command-line interface for GIOŚ air-quality data.
//!
//! Every command that contacts the remote service falls back to the local
//! cache when the service is unreachable, and says so: text output carries a
//! `[live]` or `[cached]` tag, JSON output a `provenance` field.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stations` | List measuring stations, optionally by city |
//! | `sensors` | List the sensors of a station |
//! | `fetch` | Current series of a sensor |
//! | `history` | Cached history of a sensor (never contacts the service) |
//! | `analyze` | Statistics, trend, anomalies and hourly profile of cached history |
//! | `index` | Current air-quality index of a station |
//! | `watch` | Poll sensors continuously |
//! | `cache` | Inspect or export the local database |
//! | `config` | Show, locate or create the configuration file |
//!
//! # Configuration
//!
//! Settings are read from `<config_dir>/airq/config.toml` and can be
//! overridden with `--config`, `--db`, `--base-url`, `--timeout-ms` and
//! `--retention-hours`.
//!
//! # Environment Variables
//!
//! - `AIRQ_CONFIG`, `AIRQ_DB`, `AIRQ_BASE_URL`: same as the matching flags
//! - `RUST_LOG`: log filter when neither `--verbose` nor `--quiet` is given
//! - `NO_COLOR`: disable colored output when set
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 1 | Any other failure |
//! | 2 | No data: the service failed and nothing usable is cached |
//! | 3 | The local database failed |
//! | 4 | Invalid configuration |
//!
//! # Examples
//!
//! ```bash
//! airq stations --city Kraków
//! airq fetch 16784
//! airq analyze 16784 --hours 12 --anomalies
//! airq cache export 16784 --output pm10.csv
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod format;
pub mod util;

pub use airq_core;
pub use airq_types;
