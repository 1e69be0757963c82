//! Descriptive and trend statistics over measurement series.
//!
//! Everything here is a pure function of its input slice. Absent samples
//! count towards [`AnalysisSummary::count`] but are excluded from numeric
//! aggregates; statistics that cannot be computed are `None`.
//!
//! # Example
//!
//! ```
//! use airq_core::analysis::{summarize, DEFAULT_TREND_EPSILON};
//! use airq_types::{Sample, Trend};
//! use time::{Duration, macros::datetime};
//!
//! let start = datetime!(2024-03-01 0:00 UTC);
//! let samples: Vec<Sample> = [1.0, 2.0, 3.0, 4.0, 5.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, v)| Sample::new(92, start + Duration::hours(i as i64), *v))
//!     .collect();
//!
//! let summary = summarize(&samples, DEFAULT_TREND_EPSILON);
//! assert_eq!(summary.trend, Some(Trend::Rising));
//! assert_eq!(summary.trend_strength, Some(1.0));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use airq_types::{AnalysisSummary, Sample, SourceZone, Trend};

/// Slopes within `±0.1` value units per slot are classified as flat.
pub const DEFAULT_TREND_EPSILON: f64 = 0.1;

/// Default z-score above which a sample is reported as an anomaly.
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;

/// A sample whose value lies far from the series mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// The offending sample.
    pub sample: Sample,
    /// Its value.
    pub value: f64,
    /// Signed distance from the mean in sample standard deviations.
    pub z_score: f64,
}

/// Mean of the present values observed at one hour of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyAverage {
    /// Local hour of day, 0-23, in the source zone.
    pub hour: u8,
    /// Mean of the values at that hour.
    pub mean: f64,
    /// Number of values folded into the mean.
    pub count: usize,
}

/// Present values paired with their position in the input.
fn present(samples: &[Sample]) -> Vec<(usize, f64)> {
    samples
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.value.map(|v| (i, v)))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of a non-empty slice; sorts a copy.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Ordinary least squares of value against input position.
///
/// Returns the slope and, unless the values have zero variance, R².
fn linear_fit(points: &[(usize, f64)]) -> Option<(f64, Option<f64>)> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| *x as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| *y).sum::<f64>() / n;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        let dx = *x as f64 - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    // Positions are distinct, so sxx > 0 for two or more points.
    let slope = sxy / sxx;
    let r_squared = (syy > 0.0).then(|| ((sxy * sxy) / (sxx * syy)).clamp(0.0, 1.0));

    Some((slope, r_squared))
}

/// Compute the summary of a chronologically ordered series.
///
/// `trend_epsilon` is the slope magnitude, in value units per sample slot, at
/// or below which the trend is [`Trend::Flat`].
pub fn summarize(samples: &[Sample], trend_epsilon: f64) -> AnalysisSummary {
    let points = present(samples);
    let mut summary = AnalysisSummary {
        count: samples.len(),
        present_count: points.len(),
        absent_count: samples.len() - points.len(),
        ..Default::default()
    };

    if points.is_empty() {
        return summary;
    }

    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();

    // First occurrence wins for ties.
    let (mut min_pos, mut min) = points[0];
    let (mut max_pos, mut max) = points[0];
    for &(pos, value) in &points[1..] {
        if value < min {
            min = value;
            min_pos = pos;
        }
        if value > max {
            max = value;
            max_pos = pos;
        }
    }

    let avg = mean(&values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;

    summary.min = Some(min);
    summary.max = Some(max);
    summary.mean = Some(avg);
    summary.median = Some(median(&values));
    summary.std_dev = Some(variance.sqrt());
    summary.range = Some(max - min);
    summary.min_at = Some(samples[min_pos].timestamp);
    summary.max_at = Some(samples[max_pos].timestamp);

    if let Some((slope, r_squared)) = linear_fit(&points) {
        summary.trend = Some(Trend::from_slope(slope, trend_epsilon));
        summary.trend_slope = Some(slope);
        summary.trend_strength = r_squared;
    }

    summary
}

/// Samples whose z-score magnitude exceeds `threshold`.
///
/// Uses the sample standard deviation (n - 1). Returns nothing for fewer
/// than three present values or when every value is the same.
pub fn detect_anomalies(samples: &[Sample], threshold: f64) -> Vec<Anomaly> {
    let values: Vec<f64> = samples.iter().filter_map(|s| s.value).collect();
    if values.len() < 3 {
        return Vec::new();
    }

    let avg = mean(&values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    let sd = variance.sqrt();
    if sd == 0.0 {
        return Vec::new();
    }

    samples
        .iter()
        .filter_map(|sample| {
            let value = sample.value?;
            let z_score = (value - avg) / sd;
            (z_score.abs() > threshold).then(|| Anomaly {
                sample: *sample,
                value,
                z_score,
            })
        })
        .collect()
}

/// Mean of present values per local hour of day in `zone`, ordered by hour.
///
/// Only the instant of each sample matters, not the offset it carries.
/// Hours without any present value are omitted.
pub fn hourly_averages(samples: &[Sample], zone: SourceZone) -> Vec<HourlyAverage> {
    let mut buckets: BTreeMap<u8, (f64, usize)> = BTreeMap::new();
    for sample in samples {
        if let Some(value) = sample.value {
            let hour = zone.localize(sample.timestamp).hour();
            let bucket = buckets.entry(hour).or_insert((0.0, 0));
            bucket.0 += value;
            bucket.1 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(hour, (sum, count))| HourlyAverage {
            hour,
            mean: sum / count as f64,
            count,
        })
        .collect()
}
