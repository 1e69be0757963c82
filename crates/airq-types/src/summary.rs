//! Derived statistics over a measurement series.
//!
//! Values here are computed on demand and never persisted. Fields that cannot
//! be computed for the given input are `None` rather than a sentinel.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Direction of the least-squares trend line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Trend {
    /// Slope above the configured epsilon.
    Rising,
    /// Slope below minus the configured epsilon.
    Falling,
    /// Slope within the epsilon band.
    Flat,
}

impl Trend {
    /// Classify a slope against an epsilon band.
    ///
    /// # Examples
    ///
    /// ```
    /// use airq_types::Trend;
    ///
    /// assert_eq!(Trend::from_slope(0.5, 0.1), Trend::Rising);
    /// assert_eq!(Trend::from_slope(-0.5, 0.1), Trend::Falling);
    /// assert_eq!(Trend::from_slope(0.05, 0.1), Trend::Flat);
    /// ```
    #[must_use]
    pub fn from_slope(slope: f64, epsilon: f64) -> Self {
        let epsilon = epsilon.abs();
        if slope > epsilon {
            Trend::Rising
        } else if slope < -epsilon {
            Trend::Falling
        } else {
            Trend::Flat
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Rising => write!(f, "rising"),
            Trend::Falling => write!(f, "falling"),
            Trend::Flat => write!(f, "flat"),
        }
    }
}

/// Descriptive and trend statistics for a sample sequence.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisSummary {
    /// Total number of samples, absent ones included.
    pub count: usize,
    /// Number of samples carrying a value.
    pub present_count: usize,
    /// Number of samples without a value.
    pub absent_count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Population standard deviation.
    pub std_dev: Option<f64>,
    /// `max - min`.
    pub range: Option<f64>,
    /// Timestamp of the first sample holding the minimum.
    #[cfg_attr(
        feature = "serde",
        serde(default, with = "time::serde::rfc3339::option")
    )]
    pub min_at: Option<OffsetDateTime>,
    /// Timestamp of the first sample holding the maximum.
    #[cfg_attr(
        feature = "serde",
        serde(default, with = "time::serde::rfc3339::option")
    )]
    pub max_at: Option<OffsetDateTime>,
    pub trend: Option<Trend>,
    /// Slope of the fitted line, in value units per sample slot.
    pub trend_slope: Option<f64>,
    /// Coefficient of determination (R²) of the fit, in [0, 1].
    pub trend_strength: Option<f64>,
}

impl AnalysisSummary {
    /// Whether any numeric aggregate could be computed.
    #[must_use]
    pub fn has_values(&self) -> bool {
        self.present_count > 0
    }
}
