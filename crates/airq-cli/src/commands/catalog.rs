//! Station, sensor and index commands.

use anyhow::Result;
use airq_types::StationId;

use crate::cli::OutputFormat;
use crate::format::{
    format_index_text, format_sensors_csv, format_sensors_text, format_stations_csv,
    format_stations_text,
};
use crate::util::{CommandContext, open_controller};

pub async fn cmd_stations(ctx: &CommandContext, city: Option<String>) -> Result<()> {
    let controller = open_controller(&ctx.config)?;
    let mut stations = controller.stations().await?;

    if let Some(city) = city.as_deref() {
        stations.data.retain(|s| s.in_city(city));
    }

    let content = match ctx.format {
        OutputFormat::Json => ctx.opts.as_json(&stations)?,
        OutputFormat::Csv => format_stations_csv(&stations.data, &ctx.opts),
        OutputFormat::Text => format_stations_text(&stations, &ctx.opts),
    };
    ctx.write(&content)
}

pub async fn cmd_sensors(ctx: &CommandContext, station_id: StationId) -> Result<()> {
    let controller = open_controller(&ctx.config)?;
    let sensors = controller.sensors(station_id).await?;

    let content = match ctx.format {
        OutputFormat::Json => ctx.opts.as_json(&sensors)?,
        OutputFormat::Csv => format_sensors_csv(&sensors.data, &ctx.opts),
        OutputFormat::Text => format_sensors_text(&sensors, &ctx.opts),
    };
    ctx.write(&content)
}

pub async fn cmd_index(ctx: &CommandContext, station_id: StationId) -> Result<()> {
    let controller = open_controller(&ctx.config)?;
    let index = controller.index(station_id).await?;

    let content = match ctx.format {
        OutputFormat::Json | OutputFormat::Csv => ctx.opts.as_json(&index)?,
        OutputFormat::Text => format_index_text(&index, &ctx.opts),
    };
    ctx.write(&content)
}
