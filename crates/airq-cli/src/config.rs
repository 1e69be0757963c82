//! Configuration resolution for the CLI.
//!
//! Settings come from the configuration file (if it exists), then from
//! command-line flags and environment variables, which take precedence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use airq_core::Config;
use airq_core::config::default_config_path;

use crate::cli::{ConfigAction, ConfigOverrides};

/// Path of the configuration file in effect.
pub fn config_path(overrides: &ConfigOverrides) -> PathBuf {
    overrides
        .config
        .clone()
        .unwrap_or_else(default_config_path)
}

/// Load the configuration file and apply overrides.
///
/// A missing file is not an error unless it was named explicitly.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<Config> {
    let path = config_path(overrides);
    let mut config = if path.exists() {
        Config::load(&path).map_err(airq_core::Error::from)?
    } else if overrides.config.is_some() {
        bail!("Config file not found: {}", path.display());
    } else {
        Config::default()
    };

    apply_overrides(&mut config, overrides);
    config.validate().map_err(airq_core::Error::from)?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(url) = &overrides.base_url {
        config.remote_base_url = url.clone();
    }
    if let Some(ms) = overrides.timeout_ms {
        config.request_timeout_ms = ms;
    }
    if let Some(hours) = overrides.retention_hours {
        config.retention_hours = hours;
    }
    if let Some(db) = &overrides.db {
        config.storage.path = db.clone();
    }
}

/// Execute the config command.
pub fn cmd_config(action: ConfigAction, overrides: &ConfigOverrides) -> Result<String> {
    let path = config_path(overrides);
    match action {
        ConfigAction::Path => Ok(format!("{}\n", path.display())),
        ConfigAction::Show => {
            let config = resolve_config(overrides)?;
            toml_string(&config)
        }
        ConfigAction::Init { force } => {
            init_config(&path, overrides, force)?;
            Ok(format!("Wrote {}\n", path.display()))
        }
    }
}

fn init_config(path: &Path, overrides: &ConfigOverrides, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let mut config = Config::default();
    apply_overrides(&mut config, overrides);
    config.validate().map_err(airq_core::Error::from)?;
    config
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn toml_string(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to render configuration")
}
