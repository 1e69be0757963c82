//! Command implementations for the CLI.

mod analyze;
mod cache;
mod catalog;
mod fetch;
mod history;
mod watch;

pub use analyze::{AnalyzeArgs, cmd_analyze};
pub use cache::cmd_cache;
pub use catalog::{cmd_index, cmd_sensors, cmd_stations};
pub use fetch::cmd_fetch;
pub use history::cmd_history;
pub use watch::{WatchArgs, cmd_watch};
