//! Core types for air-quality stations, sensors and measurements.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ParseError, ParseResult};

/// Identifier of a monitoring station.
pub type StationId = i64;

/// Identifier of a sensor (measuring post).
pub type SensorId = i64;

/// Postal/administrative location of a station.
///
/// Every part is optional; the agency omits fields freely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Address {
    /// City name.
    pub city: Option<String>,
    /// Commune (gmina).
    pub commune: Option<String>,
    /// District (powiat).
    pub district: Option<String>,
    /// Province (województwo).
    pub province: Option<String>,
    /// Street and number.
    pub street: Option<String>,
}

/// A physical air-quality monitoring location.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Station {
    /// Unique station identifier.
    pub id: StationId,
    /// Display name.
    pub name: String,
    /// WGS84 latitude.
    pub latitude: Option<f64>,
    /// WGS84 longitude.
    pub longitude: Option<f64>,
    /// Address composite.
    pub address: Address,
}

impl Station {
    /// Case-insensitive substring match on the station's city name.
    ///
    /// # Examples
    ///
    /// ```
    /// use airq_types::{Address, Station};
    ///
    /// let station = Station {
    ///     id: 114,
    ///     name: "Wrocław, ul. Bartnicza".to_string(),
    ///     latitude: Some(51.115933),
    ///     longitude: Some(17.141125),
    ///     address: Address { city: Some("Wrocław".to_string()), ..Default::default() },
    /// };
    /// assert!(station.in_city("wroc"));
    /// assert!(!station.in_city("Kraków"));
    /// ```
    #[must_use]
    pub fn in_city(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.address
            .city
            .as_deref()
            .is_some_and(|city| city.to_lowercase().contains(&query))
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address.city {
            Some(city) => write!(f, "{} ({})", self.name, city),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Descriptor of the quantity a sensor measures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Parameter {
    /// Agency parameter identifier.
    pub id: Option<i64>,
    /// Human-readable name, e.g. "pył zawieszony PM10".
    pub name: String,
    /// Chemical formula or symbol, e.g. "PM10".
    pub formula: String,
    /// Short code, e.g. "PM10".
    pub code: String,
}

/// One parameter-measuring instrument at a station.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sensor {
    /// Unique sensor identifier.
    pub id: SensorId,
    /// Owning station.
    pub station_id: StationId,
    /// What this sensor measures.
    pub parameter: Parameter,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameter.code.is_empty() {
            write!(f, "sensor {}", self.id)
        } else {
            write!(f, "{} (sensor {})", self.parameter.code, self.id)
        }
    }
}

/// One timestamped reading, or the absence of one, for a sensor.
///
/// A missing reading is `value: None`; it is never encoded as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Sensor the sample belongs to.
    pub sensor_id: SensorId,
    /// Time slot of the measurement.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
    /// Measured value, `None` when the slot has no reading.
    pub value: Option<f64>,
}

impl Sample {
    /// Create a sample with a measured value.
    pub fn new(sensor_id: SensorId, timestamp: OffsetDateTime, value: f64) -> Self {
        Self {
            sensor_id,
            timestamp,
            value: Some(value),
        }
    }

    /// Create a sample for a slot without a reading.
    pub fn absent(sensor_id: SensorId, timestamp: OffsetDateTime) -> Self {
        Self {
            sensor_id,
            timestamp,
            value: None,
        }
    }

    /// Whether the sample carries a value.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Highest level on the agency's index scale.
pub const MAX_INDEX_LEVEL: u8 = 5;

/// A level on the 0 (very good) to 5 (very bad) air-quality index scale.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexLevel {
    /// Numeric level, 0..=5.
    pub value: u8,
    /// Label as published by the agency.
    pub name: String,
}

impl IndexLevel {
    /// Create a level, validating the 0..=5 range.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidIndexLevel`] when `value` is outside the scale.
    pub fn new(value: i64, name: impl Into<String>) -> ParseResult<Self> {
        if !(0..=i64::from(MAX_INDEX_LEVEL)).contains(&value) {
            return Err(ParseError::InvalidIndexLevel(value));
        }
        Ok(Self {
            value: value as u8,
            name: name.into(),
        })
    }

    /// Interpret a level as published on the wire.
    ///
    /// The agency marks "no index computed" with a negative level; that maps to
    /// `Ok(None)`. A missing label falls back to [`IndexLevel::default_label`].
    ///
    /// # Examples
    ///
    /// ```
    /// use airq_types::IndexLevel;
    ///
    /// assert_eq!(IndexLevel::from_wire(-1, None), Ok(None));
    /// let level = IndexLevel::from_wire(1, None).unwrap().unwrap();
    /// assert_eq!(level.name, "Dobry");
    /// assert!(IndexLevel::from_wire(9, None).is_err());
    /// ```
    pub fn from_wire(value: i64, name: Option<&str>) -> ParseResult<Option<Self>> {
        if value < 0 {
            return Ok(None);
        }
        let label = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => Self::default_label(value).unwrap_or_default().to_string(),
        };
        Self::new(value, label).map(Some)
    }

    /// The agency's standard label for a level.
    #[must_use]
    pub fn default_label(value: i64) -> Option<&'static str> {
        match value {
            0 => Some("Bardzo dobry"),
            1 => Some("Dobry"),
            2 => Some("Umiarkowany"),
            3 => Some("Dostateczny"),
            4 => Some("Zły"),
            5 => Some("Bardzo zły"),
            _ => None,
        }
    }
}

impl fmt::Display for IndexLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.value)
    }
}

/// Index computed for a single parameter (PM10, NO2, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubIndex {
    /// Parameter code the sub-index was computed for.
    pub parameter: String,
    /// Level, `None` when the agency computed no index.
    pub level: Option<IndexLevel>,
    /// When this sub-index was computed.
    #[cfg_attr(
        feature = "serde",
        serde(default, with = "time::serde::rfc3339::option")
    )]
    pub calculated_at: Option<OffsetDateTime>,
    /// Timestamp of the measurements this sub-index was computed from.
    #[cfg_attr(
        feature = "serde",
        serde(default, with = "time::serde::rfc3339::option")
    )]
    pub source_data_at: Option<OffsetDateTime>,
}

/// Air-quality index snapshot for a station.
///
/// Snapshots are never mutated; each calculation timestamp is a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AirQualityIndex {
    /// Station the index was computed for.
    pub station_id: StationId,
    /// When the overall index was computed.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub calculated_at: OffsetDateTime,
    /// Overall level, `None` when no index could be computed.
    pub level: Option<IndexLevel>,
    /// Per-parameter sub-indices.
    pub sub_indices: Vec<SubIndex>,
    /// Timestamp of the source data behind the overall index.
    #[cfg_attr(
        feature = "serde",
        serde(default, with = "time::serde::rfc3339::option")
    )]
    pub source_data_at: Option<OffsetDateTime>,
}

impl AirQualityIndex {
    /// Label of the overall level, if one was computed.
    #[must_use]
    pub fn level_name(&self) -> Option<&str> {
        self.level.as_ref().map(|l| l.name.as_str())
    }

    /// Look up the sub-index for a parameter code (case-insensitive).
    #[must_use]
    pub fn sub_index(&self, parameter: &str) -> Option<&SubIndex> {
        self.sub_indices
            .iter()
            .find(|s| s.parameter.eq_ignore_ascii_case(parameter))
    }
}

/// Where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Provenance {
    /// Fetched from the remote service during this request.
    Live,
    /// Served from the local cache because the remote service failed.
    Cached,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live => write!(f, "live"),
            Provenance::Cached => write!(f, "cached"),
        }
    }
}
