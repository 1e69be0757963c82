//! Analyze command: statistics over cached history.

use anyhow::Result;
use airq_core::analysis::{detect_anomalies, hourly_averages};
use airq_types::SensorId;

use crate::cli::OutputFormat;
use crate::format::{
    AnalysisReport, format_anomalies_text, format_hourly_text, format_summary_text,
};
use crate::util::{CommandContext, open_controller};

/// Arguments for the analyze command.
pub struct AnalyzeArgs {
    pub sensor_id: SensorId,
    pub hours: Option<u32>,
    pub anomalies: bool,
    pub threshold: f64,
    pub hourly: bool,
}

pub async fn cmd_analyze(ctx: &CommandContext, args: AnalyzeArgs) -> Result<()> {
    let AnalyzeArgs {
        sensor_id,
        hours,
        anomalies,
        threshold,
        hourly,
    } = args;
    let hours = hours.unwrap_or(ctx.config.retention_hours);

    let controller = open_controller(&ctx.config)?;
    let samples = controller.query_history(sensor_id, hours).await?;
    let summary = controller.summarize(&samples);

    let anomaly_list = anomalies.then(|| detect_anomalies(&samples, threshold));
    let hourly_list = hourly.then(|| hourly_averages(&samples, ctx.opts.zone));

    let content = match ctx.format {
        OutputFormat::Json | OutputFormat::Csv => ctx.opts.as_json(&AnalysisReport {
            sensor_id,
            hours,
            summary: &summary,
            anomalies: anomaly_list.as_deref(),
            hourly: hourly_list.as_deref(),
        })?,
        OutputFormat::Text => {
            let mut out = format_summary_text(sensor_id, &summary, &ctx.opts);
            if let Some(list) = &anomaly_list {
                out.push('\n');
                out.push_str(&format_anomalies_text(list, &ctx.opts));
            }
            if let Some(list) = &hourly_list {
                out.push('\n');
                out.push_str(&format_hourly_text(list));
            }
            out
        }
    };
    ctx.write(&content)
}
