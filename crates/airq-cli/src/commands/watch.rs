//! Watch command: poll sensors until interrupted.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use airq_core::Poller;
use airq_types::SensorId;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::OutputFormat;
use crate::format::format_poll_event_line;
use crate::util::{CommandContext, open_controller};

/// Shortest accepted poll interval.
const MIN_INTERVAL_SECS: u64 = 10;

/// Arguments for the watch command.
pub struct WatchArgs {
    pub sensors: Vec<SensorId>,
    pub interval: u64,
    pub count: u32,
}

pub async fn cmd_watch(ctx: &CommandContext, args: WatchArgs) -> Result<()> {
    let WatchArgs {
        sensors,
        interval,
        count,
    } = args;

    if interval < MIN_INTERVAL_SECS {
        bail!("Interval must be at least {MIN_INTERVAL_SECS} seconds");
    }

    // One line per event, appended.
    let mut sink: Box<dyn Write> = match &ctx.output {
        Some(path) => Box::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let controller = Arc::new(open_controller(&ctx.config)?);
    let mut poller = Poller::new(controller);
    let mut events = poller.subscribe();
    poller.start(&sensors, Duration::from_secs(interval))?;

    if !ctx.quiet {
        eprintln!(
            "Watching {} sensor(s) every {}s. Press Ctrl+C to stop.",
            sensors.len(),
            interval
        );
    }

    let mut received = 0u32;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    let line = match ctx.format {
                        OutputFormat::Json | OutputFormat::Csv => {
                            ctx.opts.with_compact(true).as_json(&event)?
                        }
                        OutputFormat::Text => format_poll_event_line(&event, &ctx.opts),
                    };
                    sink.write_all(line.as_bytes())?;
                    sink.flush()?;

                    received += 1;
                    if count > 0 && received >= count {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Output fell behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    poller.stop().await;
    Ok(())
}
