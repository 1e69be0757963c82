//! Shared helpers for command implementations.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use airq_core::{Config, Error, GiosClient, ResilienceController, SqliteRepository};

use crate::cli::OutputFormat;
use crate::format::FormatOptions;

/// Controller over the real service and the configured database.
pub type Controller = ResilienceController<GiosClient, SqliteRepository>;

/// Everything a command needs besides its own arguments.
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub quiet: bool,
    pub opts: FormatOptions,
}

impl CommandContext {
    /// Write command output to the `--output` file or stdout.
    pub fn write(&self, content: &str) -> Result<()> {
        write_output(self.output.as_ref(), content)
    }
}

/// Build a controller from the effective configuration.
pub fn open_controller(config: &Config) -> Result<Controller> {
    let zone = config
        .source_zone()
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let client = GiosClient::new(&config.remote_base_url, config.request_timeout())
        .map_err(Error::from)
        .context("Failed to create HTTP client")?
        .with_source_zone(zone);

    let repository = SqliteRepository::open(&config.storage.path)
        .map_err(Error::from)
        .with_context(|| format!("Failed to open database {}", config.storage.path.display()))?;

    Ok(ResilienceController::from_config(client, repository, config))
}

/// Write output to file or stdout
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

/// User-facing message for a failed command.
///
/// An empty cache and a broken database read differently even though both
/// leave the command without data.
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.chain().find_map(|e| e.downcast_ref::<Error>()) {
        Some(Error::NoDataAvailable { what }) => format!(
            "No data available for {what}: the remote service could not be reached \
             and nothing usable is cached."
        ),
        Some(Error::Storage(e)) => format!("Local storage failed: {e}"),
        Some(Error::InvalidConfig(message)) => format!("Invalid configuration: {message}"),
        _ => format!("Error: {err:#}"),
    }
}

/// Process exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.chain().find_map(|e| e.downcast_ref::<Error>()) {
        Some(Error::NoDataAvailable { .. }) => 2,
        Some(Error::Storage(_)) => 3,
        Some(Error::InvalidConfig(_)) => 4,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_and_storage_read_differently() {
        let no_data = anyhow::Error::new(Error::no_data("sensor 92"));
        let storage = anyhow::Error::new(Error::Storage(airq_store::Error::InvalidData(
            "bad row".to_string(),
        )));

        let no_data_msg = describe_error(&no_data);
        let storage_msg = describe_error(&storage);
        assert!(no_data_msg.starts_with("No data available for sensor 92"));
        assert!(storage_msg.starts_with("Local storage failed"));
        assert_eq!(exit_code(&no_data), 2);
        assert_eq!(exit_code(&storage), 3);
    }

    #[test]
    fn test_context_does_not_hide_kind() {
        let err = anyhow::Error::new(Error::no_data("sensor 1")).context("fetch failed");
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        write_output(Some(&path), "hello\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello\n");
    }
}
