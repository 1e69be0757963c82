use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use airq_cli::cli::{Cli, Commands};
use airq_cli::commands::{
    AnalyzeArgs, WatchArgs, cmd_analyze, cmd_cache, cmd_fetch, cmd_history, cmd_index,
    cmd_sensors, cmd_stations, cmd_watch,
};
use airq_cli::config::{cmd_config, resolve_config};
use airq_cli::format::FormatOptions;
use airq_cli::util::{CommandContext, describe_error, exit_code, write_output};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("{}", describe_error(&err));
        std::process::exit(exit_code(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        quiet,
        format,
        compact,
        no_color,
        output,
        overrides,
        command,
        ..
    } = cli;

    let command = match command {
        Commands::Config { action } => {
            let content = cmd_config(action, &overrides)?;
            return write_output(output.as_ref(), &content);
        }
        other => other,
    };

    let config = resolve_config(&overrides)?;
    let zone = config.source_zone().unwrap_or_default();
    let ctx = CommandContext {
        opts: FormatOptions::new(no_color || output.is_some(), zone).with_compact(compact),
        config,
        format,
        output,
        quiet,
    };

    match command {
        Commands::Stations { city } => cmd_stations(&ctx, city).await,
        Commands::Sensors { station } => cmd_sensors(&ctx, station).await,
        Commands::Fetch { sensor } => cmd_fetch(&ctx, sensor).await,
        Commands::History { sensor, hours } => cmd_history(&ctx, sensor, hours).await,
        Commands::Analyze {
            sensor,
            hours,
            anomalies,
            threshold,
            hourly,
        } => {
            let args = AnalyzeArgs {
                sensor_id: sensor,
                hours,
                anomalies,
                threshold,
                hourly,
            };
            cmd_analyze(&ctx, args).await
        }
        Commands::Index { station } => cmd_index(&ctx, station).await,
        Commands::Watch {
            sensors,
            interval,
            count,
        } => {
            let args = WatchArgs {
                sensors,
                interval,
                count,
            };
            cmd_watch(&ctx, args).await
        }
        Commands::Cache { action } => cmd_cache(&ctx, action),
        Commands::Config { .. } => unreachable!("handled above"),
    }
}
