//! Fetch command: current series, live or cached.

use anyhow::Result;
use airq_types::SensorId;

use crate::cli::OutputFormat;
use crate::format::{format_series_csv, format_series_text};
use crate::util::{CommandContext, open_controller};

pub async fn cmd_fetch(ctx: &CommandContext, sensor_id: SensorId) -> Result<()> {
    let controller = open_controller(&ctx.config)?;
    let series = controller.current_series(sensor_id).await?;

    if !ctx.quiet && !series.is_live() {
        eprintln!("Remote service unavailable; showing cached data.");
    }

    let content = match ctx.format {
        OutputFormat::Json => ctx.opts.as_json(&series)?,
        OutputFormat::Csv => format_series_csv(&series.data, &ctx.opts),
        OutputFormat::Text => {
            format_series_text(sensor_id, &series.data, series.provenance, &ctx.opts)
        }
    };
    ctx.write(&content)
}
