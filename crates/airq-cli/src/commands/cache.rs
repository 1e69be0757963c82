//! Cache command - query local database.

use anyhow::{Context, Result};
use airq_store::{SampleQuery, Store};
use airq_types::SensorId;
use time::OffsetDateTime;

use crate::cli::{CacheAction, OutputFormat};
use crate::format::format_series_info_text;
use crate::util::CommandContext;

/// Execute the cache command.
pub fn cmd_cache(ctx: &CommandContext, action: CacheAction) -> Result<()> {
    let path = &ctx.config.storage.path;
    let store = Store::open(path)
        .map_err(airq_core::Error::from)
        .with_context(|| format!("Failed to open database {}", path.display()))?;

    let content = match action {
        CacheAction::Info => show_info(ctx, &store)?,
        CacheAction::Range { sensor } => show_range(ctx, &store, sensor)?,
        CacheAction::Export { sensor, hours } => export(&store, sensor, hours)?,
    };
    ctx.write(&content)
}

fn show_info(ctx: &CommandContext, store: &Store) -> Result<String> {
    let series = store.list_series().map_err(airq_core::Error::from)?;

    if ctx.format == OutputFormat::Json {
        return ctx.opts.as_json(&serde_json::json!({
            "path": ctx.config.storage.path,
            "retention_hours": ctx.config.retention_hours,
            "series": series,
        }));
    }

    let mut out = format!("Database: {}\n", ctx.config.storage.path.display());
    out.push_str(&format!(
        "Retention: {}h per sensor\n",
        ctx.config.retention_hours
    ));
    let total: u64 = series.iter().map(|s| s.sample_count).sum();
    out.push_str(&format!(
        "Series: {} ({} samples)\n\n",
        series.len(),
        total
    ));
    out.push_str(&format_series_info_text(&series, &ctx.opts));
    Ok(out)
}

fn show_range(ctx: &CommandContext, store: &Store, sensor_id: SensorId) -> Result<String> {
    let range = store.sample_range(sensor_id).map_err(airq_core::Error::from)?;
    let count = store
        .count_samples(Some(sensor_id))
        .map_err(airq_core::Error::from)?;

    let Some((oldest, newest)) = range else {
        return Err(airq_core::Error::no_data(format!("sensor {sensor_id} in the cache")).into());
    };

    if ctx.format == OutputFormat::Json {
        let rfc = &time::format_description::well_known::Rfc3339;
        return ctx.opts.as_json(&serde_json::json!({
            "sensor_id": sensor_id,
            "samples": count,
            "oldest": oldest.format(rfc)?,
            "newest": newest.format(rfc)?,
        }));
    }

    Ok(format!(
        "Sensor {}: {} sample(s) from {} to {}\n",
        sensor_id,
        count,
        ctx.opts.format_time(oldest),
        ctx.opts.format_time(newest)
    ))
}

fn export(store: &Store, sensor_id: SensorId, hours: Option<u32>) -> Result<String> {
    let mut query = SampleQuery::new(sensor_id);
    if let Some(hours) = hours {
        let now = OffsetDateTime::now_utc();
        let since = now
            .checked_sub(time::Duration::hours(i64::from(hours)))
            .map_or(OffsetDateTime::UNIX_EPOCH, |since| {
                since.max(OffsetDateTime::UNIX_EPOCH)
            });
        query = query.since(since).until(now);
    }
    let csv = store
        .export_samples_csv(&query)
        .map_err(airq_core::Error::from)?;
    Ok(csv)
}
