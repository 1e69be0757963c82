//! Output formatting utilities for text, JSON, and CSV output.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use airq_core::analysis::{Anomaly, HourlyAverage};
use airq_core::{PollEvent, PollOutcome, Sourced};
use airq_store::SeriesInfo;
use airq_types::{
    AirQualityIndex, AnalysisSummary, Provenance, Sample, Sensor, SensorId, SourceZone, Station,
    Trend,
};

/// Formatting options for output.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Omit header row in CSV output.
    pub no_header: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
    /// Zone timestamps are shown in for text output.
    pub zone: SourceZone,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            no_color: false,
            no_header: false,
            compact: false,
            zone: SourceZone::Fixed(UtcOffset::UTC),
        }
    }
}

impl FormatOptions {
    pub fn new(no_color: bool, zone: SourceZone) -> Self {
        Self {
            no_color,
            zone,
            ..Self::default()
        }
    }

    /// Create with compact JSON option.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Create with no_header option for CSV output.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    /// Local time in the display zone, minute precision.
    #[must_use]
    pub fn format_time(&self, ts: OffsetDateTime) -> String {
        self.zone
            .localize(ts)
            .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
            .unwrap_or_else(|_| ts.to_string())
    }
}

/// Escape a value for CSV output.
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Bracketed provenance tag, green when live and yellow when cached.
pub fn format_provenance(provenance: Provenance, no_color: bool) -> String {
    let tag = format!("[{provenance}]");
    if no_color {
        return tag;
    }
    match provenance {
        Provenance::Live => tag.green().to_string(),
        Provenance::Cached => tag.yellow().to_string(),
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    }
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "n/a".to_string(),
    }
}

// ============================================================================
// Catalog
// ============================================================================

pub fn format_stations_text(stations: &Sourced<Vec<Station>>, opts: &FormatOptions) -> String {
    let mut out = format!(
        "{} {} station(s)\n",
        format_provenance(stations.provenance, opts.no_color),
        stations.data.len()
    );
    for station in &stations.data {
        out.push_str(&format!("  {:>6}  {}", station.id, station));
        if let Some(street) = &station.address.street {
            out.push_str(&format!(", {street}"));
        }
        out.push('\n');
    }
    out
}

pub fn format_stations_csv(stations: &[Station], opts: &FormatOptions) -> String {
    let mut out = String::new();
    if !opts.no_header {
        out.push_str("id,name,city,latitude,longitude\n");
    }
    for station in stations {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            station.id,
            csv_escape(&station.name),
            csv_escape(station.address.city.as_deref().unwrap_or("")),
            station.latitude.map(|v| v.to_string()).unwrap_or_default(),
            station.longitude.map(|v| v.to_string()).unwrap_or_default(),
        ));
    }
    out
}

pub fn format_sensors_text(sensors: &Sourced<Vec<Sensor>>, opts: &FormatOptions) -> String {
    let mut out = format!(
        "{} {} sensor(s)\n",
        format_provenance(sensors.provenance, opts.no_color),
        sensors.data.len()
    );
    for sensor in &sensors.data {
        out.push_str(&format!(
            "  {:>6}  {:<8} {}\n",
            sensor.id, sensor.parameter.code, sensor.parameter.name
        ));
    }
    out
}

pub fn format_sensors_csv(sensors: &[Sensor], opts: &FormatOptions) -> String {
    let mut out = String::new();
    if !opts.no_header {
        out.push_str("id,station_id,code,formula,name\n");
    }
    for sensor in sensors {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            sensor.id,
            sensor.station_id,
            csv_escape(&sensor.parameter.code),
            csv_escape(&sensor.parameter.formula),
            csv_escape(&sensor.parameter.name),
        ));
    }
    out
}

// ============================================================================
// Series
// ============================================================================

/// Series as text, newest last.
pub fn format_series_text(
    sensor_id: SensorId,
    samples: &[Sample],
    provenance: Provenance,
    opts: &FormatOptions,
) -> String {
    let tag = format_provenance(provenance, opts.no_color);
    let present = samples.iter().filter(|s| s.is_present()).count();
    let mut out = format!(
        "{} sensor {}: {} sample(s), {} with values\n",
        tag,
        sensor_id,
        samples.len(),
        present
    );
    for sample in samples {
        out.push_str(&format!(
            "  {}  {:>8}\n",
            opts.format_time(sample.timestamp),
            format_value(sample.value)
        ));
    }
    out
}

pub fn format_series_csv(samples: &[Sample], opts: &FormatOptions) -> String {
    let mut out = String::new();
    if !opts.no_header {
        out.push_str("sensor_id,timestamp,value\n");
    }
    for sample in samples {
        let ts = sample
            .timestamp
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        let value = sample.value.map(|v| v.to_string()).unwrap_or_default();
        out.push_str(&format!("{},{},{}\n", sample.sensor_id, ts, value));
    }
    out
}

// ============================================================================
// Analysis
// ============================================================================

fn trend_label(trend: Option<Trend>, no_color: bool) -> String {
    let Some(trend) = trend else {
        return "n/a".to_string();
    };
    let label = trend.to_string();
    if no_color {
        return label;
    }
    match trend {
        Trend::Rising => label.red().to_string(),
        Trend::Falling => label.green().to_string(),
        Trend::Flat => label,
    }
}

pub fn format_summary_text(
    sensor_id: SensorId,
    summary: &AnalysisSummary,
    opts: &FormatOptions,
) -> String {
    let mut out = format!(
        "Sensor {}: {} sample(s), {} present, {} absent\n",
        sensor_id, summary.count, summary.present_count, summary.absent_count
    );
    if !summary.has_values() {
        out.push_str("  No values to analyze.\n");
        return out;
    }

    let at = |ts: Option<OffsetDateTime>| {
        ts.map(|t| format!(" at {}", opts.format_time(t)))
            .unwrap_or_default()
    };
    out.push_str(&format!(
        "  Min:     {}{}\n",
        format_optional(summary.min, 2),
        at(summary.min_at)
    ));
    out.push_str(&format!(
        "  Max:     {}{}\n",
        format_optional(summary.max, 2),
        at(summary.max_at)
    ));
    out.push_str(&format!("  Mean:    {}\n", format_optional(summary.mean, 2)));
    out.push_str(&format!("  Median:  {}\n", format_optional(summary.median, 2)));
    out.push_str(&format!("  Std dev: {}\n", format_optional(summary.std_dev, 2)));
    out.push_str(&format!("  Range:   {}\n", format_optional(summary.range, 2)));
    out.push_str(&format!(
        "  Trend:   {} (slope {}, R² {})\n",
        trend_label(summary.trend, opts.no_color),
        format_optional(summary.trend_slope, 3),
        format_optional(summary.trend_strength, 2)
    ));
    out
}

pub fn format_anomalies_text(anomalies: &[Anomaly], opts: &FormatOptions) -> String {
    if anomalies.is_empty() {
        return "No anomalies.\n".to_string();
    }
    let noun = if anomalies.len() == 1 {
        "anomaly"
    } else {
        "anomalies"
    };
    let mut out = format!("{} {}:\n", anomalies.len(), noun);
    for anomaly in anomalies {
        out.push_str(&format!(
            "  {}  {:>8.1}  z={:+.2}\n",
            opts.format_time(anomaly.sample.timestamp),
            anomaly.value,
            anomaly.z_score
        ));
    }
    out
}

pub fn format_hourly_text(hours: &[HourlyAverage]) -> String {
    if hours.is_empty() {
        return "No hourly data.\n".to_string();
    }
    let mut out = String::from("Hour  Mean     Count\n");
    for hour in hours {
        out.push_str(&format!(
            "{:02}:00 {:>8.1} {:>5}\n",
            hour.hour, hour.mean, hour.count
        ));
    }
    out
}

/// Analysis output bundled for JSON.
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub sensor_id: SensorId,
    pub hours: u32,
    pub summary: &'a AnalysisSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<&'a [Anomaly]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly: Option<&'a [HourlyAverage]>,
}

// ============================================================================
// Index
// ============================================================================

pub fn format_index_text(index: &Sourced<AirQualityIndex>, opts: &FormatOptions) -> String {
    let data = &index.data;
    let level = match &data.level {
        Some(level) => level.to_string(),
        None => "not computed".to_string(),
    };
    let mut out = format!(
        "{} station {}: {} (calculated {})\n",
        format_provenance(index.provenance, opts.no_color),
        data.station_id,
        level,
        opts.format_time(data.calculated_at)
    );
    for sub in &data.sub_indices {
        let level = sub
            .level
            .as_ref()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("  {:<6} {}\n", sub.parameter, level));
    }
    out
}

// ============================================================================
// Cache
// ============================================================================

pub fn format_series_info_text(series: &[SeriesInfo], opts: &FormatOptions) -> String {
    if series.is_empty() {
        return "No cached series. Run 'airq fetch <sensor>' to cache data.\n".to_string();
    }
    let mut out = String::from("Sensor   Samples  Oldest            Newest\n");
    for info in series {
        out.push_str(&format!(
            "{:<8} {:>7}  {}  {}\n",
            info.sensor_id,
            info.sample_count,
            opts.format_time(info.oldest),
            opts.format_time(info.newest)
        ));
    }
    out
}

// ============================================================================
// Watch
// ============================================================================

pub fn format_poll_event_line(event: &PollEvent, opts: &FormatOptions) -> String {
    let time = opts.format_time(event.at);
    match &event.outcome {
        PollOutcome::Updated {
            provenance,
            samples,
        } => format!(
            "{} {} sensor {}: {} sample(s)\n",
            time,
            format_provenance(*provenance, opts.no_color),
            event.sensor_id,
            samples
        ),
        PollOutcome::Failed { message } => {
            let tag = if opts.no_color {
                "[failed]".to_string()
            } else {
                "[failed]".red().to_string()
            };
            format!("{} {} sensor {}: {}\n", time, tag, event.sensor_id, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn plain() -> FormatOptions {
        FormatOptions::new(true, SourceZone::WARSAW)
    }

    #[test]
    fn test_provenance_tag_plain() {
        assert_eq!(format_provenance(Provenance::Live, true), "[live]");
        assert_eq!(format_provenance(Provenance::Cached, true), "[cached]");
    }

    #[test]
    fn test_format_time_uses_display_zone() {
        let opts = plain();
        assert_eq!(
            opts.format_time(datetime!(2024-03-01 11:00 UTC)),
            "2024-03-01 12:00"
        );
        assert_eq!(
            opts.format_time(datetime!(2024-07-01 11:00 UTC)),
            "2024-07-01 13:00"
        );
    }

    #[test]
    fn test_series_text_marks_absent() {
        let samples = vec![
            Sample::new(92, datetime!(2024-03-01 10:00 UTC), 41.2),
            Sample::absent(92, datetime!(2024-03-01 11:00 UTC)),
        ];
        let text = format_series_text(92, &samples, Provenance::Cached, &plain());
        assert!(text.starts_with("[cached] sensor 92: 2 sample(s), 1 with values"));
        assert!(text.contains("41.2"));
        assert!(text.contains("-\n"));
    }

    #[test]
    fn test_series_csv_empty_cell_for_absent() {
        let samples = vec![Sample::absent(92, datetime!(2024-03-01 11:00 UTC))];
        let csv = format_series_csv(&samples, &plain());
        assert_eq!(csv, "sensor_id,timestamp,value\n92,2024-03-01T11:00:00Z,\n");

        let csv = format_series_csv(&samples, &plain().with_no_header(true));
        assert!(!csv.contains("sensor_id"));
    }

    #[test]
    fn test_summary_without_values() {
        let summary = AnalysisSummary {
            count: 3,
            absent_count: 3,
            ..Default::default()
        };
        let text = format_summary_text(92, &summary, &plain());
        assert!(text.contains("No values to analyze"));
        assert!(!text.contains("Mean"));
    }

    #[test]
    fn test_summary_with_trend() {
        let summary = AnalysisSummary {
            count: 2,
            present_count: 2,
            min: Some(1.0),
            max: Some(3.0),
            mean: Some(2.0),
            median: Some(2.0),
            std_dev: Some(1.0),
            range: Some(2.0),
            trend: Some(Trend::Rising),
            trend_slope: Some(2.0),
            trend_strength: None,
            ..Default::default()
        };
        let text = format_summary_text(92, &summary, &plain());
        assert!(text.contains("Trend:   rising (slope 2.000, R² n/a)"));
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("Kraków, Aleja"), "\"Kraków, Aleja\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_poll_event_line() {
        let event = PollEvent {
            sensor_id: 92,
            at: datetime!(2024-03-01 11:00 UTC),
            outcome: PollOutcome::Failed {
                message: "No data available".to_string(),
            },
        };
        assert_eq!(
            format_poll_event_line(&event, &plain()),
            "2024-03-01 12:00 [failed] sensor 92: No data available\n"
        );
    }

    #[test]
    fn test_sourced_json_carries_provenance() {
        let sourced = Sourced::live(Vec::<Station>::new());
        let json = plain().with_compact(true).as_json(&sourced).unwrap();
        assert_eq!(json, "{\"data\":[],\"provenance\":\"live\"}\n");
    }
}
