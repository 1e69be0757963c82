//! History command: cached samples only.

use anyhow::Result;
use airq_core::Sourced;
use airq_types::{Provenance, SensorId};

use crate::cli::OutputFormat;
use crate::format::{format_series_csv, format_series_text};
use crate::util::{CommandContext, open_controller};

pub async fn cmd_history(
    ctx: &CommandContext,
    sensor_id: SensorId,
    hours: Option<u32>,
) -> Result<()> {
    let controller = open_controller(&ctx.config)?;
    let hours = hours.unwrap_or(ctx.config.retention_hours);
    let samples = controller.query_history(sensor_id, hours).await?;

    if samples.is_empty() && !ctx.quiet {
        eprintln!(
            "No cached samples for sensor {} in the last {}h.",
            sensor_id, hours
        );
    }

    let content = match ctx.format {
        OutputFormat::Json => ctx.opts.as_json(&Sourced::cached(&samples))?,
        OutputFormat::Csv => format_series_csv(&samples, &ctx.opts),
        OutputFormat::Text => {
            format_series_text(sensor_id, &samples, Provenance::Cached, &ctx.opts)
        }
    };
    ctx.write(&content)
}
