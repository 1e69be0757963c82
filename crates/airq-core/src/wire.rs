//! Translation of GIOŚ JSON payloads into domain types.
//!
//! Two response dialects are accepted for every endpoint:
//!
//! - the Polish-keyed v1 format, where lists are wrapped in an object
//!   (`{"Lista stacji pomiarowych": [...]}`) and fields carry descriptive
//!   names such as `Identyfikator stacji` or `Wartość`;
//! - the English-keyed legacy format (`stationName`, `values`,
//!   `stIndexLevel`, ...), usually a bare array.
//!
//! Leaf values may come as JSON numbers or as text. A measurement that is
//! `null`, missing, or empty text is absent, never an error. Anything else
//! that fails to parse rejects the whole payload.
//!
//! These functions are pure; the HTTP side lives in [`crate::client`].

use serde_json::{Map, Value};
use time::OffsetDateTime;

use airq_types::{
    Address, AirQualityIndex, IndexLevel, ParseError, Parameter, Sample, Sensor, SensorId,
    SourceZone, Station, StationId, SubIndex, text,
};

/// Errors raised while translating a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The payload does not have the expected structure.
    #[error("unexpected payload shape: {0}")]
    Shape(String),

    /// A leaf value failed to parse.
    #[error(transparent)]
    Value(#[from] ParseError),
}

/// Result type for payload translation.
pub type WireResult<T> = std::result::Result<T, WireError>;

const STATIONS_KEY: &str = "Lista stacji pomiarowych";
const SENSORS_KEY: &str = "Lista stanowisk pomiarowych dla podanej stacji";
const SERIES_KEY: &str = "Lista danych pomiarowych";
const INDEX_KEY: &str = "AqIndex";

const SUB_VALUE_PREFIX: &str = "Wartość indeksu dla wskaźnika ";
// The agency spells this one both ways.
const SUB_NAME_PREFIXES: [&str; 2] = [
    "Nazwa kategorii indeksu dla wskażnika ",
    "Nazwa kategorii indeksu dla wskaźnika ",
];
const SUB_CALC_PREFIX: &str = "Data wykonania obliczeń indeksu dla wskaźnika ";
const SUB_SOURCE_PREFIX: &str = "Data danych źródłowych, z których policzono wartość indeksu dla wskaźnika ";

// === Public entry points ===

/// Parse a `station/findAll` payload.
pub fn parse_stations(body: &Value) -> WireResult<Vec<Station>> {
    list(body, &[STATIONS_KEY])?
        .iter()
        .map(parse_station)
        .collect()
}

/// Parse a `station/sensors/{id}` payload.
///
/// Items without their own station reference are attributed to `station_id`.
pub fn parse_sensors(body: &Value, station_id: StationId) -> WireResult<Vec<Sensor>> {
    list(body, &[SENSORS_KEY, "sensors"])?
        .iter()
        .map(|item| parse_sensor(item, station_id))
        .collect()
}

/// Parse a `data/getData/{id}` payload.
///
/// Samples come back oldest first; when the payload repeats a timestamp the
/// last occurrence wins.
pub fn parse_series(
    body: &Value,
    sensor_id: SensorId,
    zone: SourceZone,
) -> WireResult<Vec<Sample>> {
    let mut samples = list(body, &[SERIES_KEY, "values", "data"])?
        .iter()
        .map(|item| parse_sample(item, sensor_id, zone))
        .collect::<WireResult<Vec<_>>>()?;

    samples.sort_by_key(|s| s.timestamp);

    let mut deduped: Vec<Sample> = Vec::with_capacity(samples.len());
    for sample in samples {
        match deduped.last_mut() {
            Some(last) if last.timestamp == sample.timestamp => *last = sample,
            _ => deduped.push(sample),
        }
    }

    Ok(deduped)
}

/// Parse an `aqindex/getIndex/{id}` payload.
pub fn parse_index(
    body: &Value,
    station_id: StationId,
    zone: SourceZone,
) -> WireResult<AirQualityIndex> {
    match body.get(INDEX_KEY) {
        Some(inner) => parse_index_v1(object(inner, INDEX_KEY)?, station_id, zone),
        None => parse_index_legacy(object(body, "index")?, station_id, zone),
    }
}

// === Items ===

fn parse_station(item: &Value) -> WireResult<Station> {
    let obj = object(item, "station")?;

    let id = required_id(obj, &["Identyfikator stacji", "id", "stationId"], "station id")?;
    let name = text_field(obj, &["Nazwa stacji", "stationName"])
        .ok_or(ParseError::MissingField("station name"))?;

    let address = match obj.get("city") {
        Some(Value::Object(city)) => {
            let commune = city.get("commune").and_then(Value::as_object);
            Address {
                city: text_field(city, &["name"]),
                commune: commune.and_then(|c| text_field(c, &["communeName"])),
                district: commune.and_then(|c| text_field(c, &["districtName"])),
                province: commune.and_then(|c| text_field(c, &["provinceName"])),
                street: text_field(obj, &["addressStreet", "Ulica"]),
            }
        }
        _ => Address {
            city: text_field(obj, &["Nazwa miasta"]),
            commune: text_field(obj, &["Gmina"]),
            district: text_field(obj, &["Powiat"]),
            province: text_field(obj, &["Województwo"]),
            street: text_field(obj, &["Ulica", "addressStreet"]),
        },
    };

    Ok(Station {
        id,
        name,
        latitude: number(field(obj, &["Szerokość geograficzna", "gegrLat"]))?,
        longitude: number(field(obj, &["Długość geograficzna", "gegrLon"]))?,
        address,
    })
}

fn parse_sensor(item: &Value, station_id: StationId) -> WireResult<Sensor> {
    let obj = object(item, "sensor")?;

    let id = required_id(obj, &["Identyfikator stanowiska", "id"], "sensor id")?;
    let station_id = optional_id(field(obj, &["Identyfikator stacji", "stationId"]))?
        .unwrap_or(station_id);

    let parameter = match obj.get("param") {
        Some(Value::Object(param)) => Parameter {
            id: optional_id(field(param, &["idParam"]))?,
            name: text_field(param, &["paramName"]).unwrap_or_default(),
            formula: text_field(param, &["paramFormula"]).unwrap_or_default(),
            code: text_field(param, &["paramCode"]).unwrap_or_default(),
        },
        _ => Parameter {
            id: optional_id(field(obj, &["Id wskaźnika", "paramId"]))?,
            name: text_field(obj, &["Wskaźnik"]).unwrap_or_default(),
            formula: text_field(obj, &["Wskaźnik - wzór"]).unwrap_or_default(),
            code: text_field(obj, &["Wskaźnik - kod"]).unwrap_or_default(),
        },
    };

    Ok(Sensor {
        id,
        station_id,
        parameter,
    })
}

fn parse_sample(item: &Value, sensor_id: SensorId, zone: SourceZone) -> WireResult<Sample> {
    let obj = object(item, "measurement")?;

    let timestamp = timestamp(field(obj, &["Data", "date"]), zone)?
        .ok_or(ParseError::MissingField("measurement date"))?;

    Ok(Sample {
        sensor_id,
        timestamp,
        value: number(field(obj, &["Wartość", "value"]))?,
    })
}

fn parse_index_v1(
    obj: &Map<String, Value>,
    station_id: StationId,
    zone: SourceZone,
) -> WireResult<AirQualityIndex> {
    let station_id =
        optional_id(field(obj, &["Identyfikator stacji pomiarowej"]))?.unwrap_or(station_id);
    let calculated_at = timestamp(field(obj, &["Data wykonania obliczeń indeksu"]), zone)?
        .ok_or(ParseError::MissingField("index calculation date"))?;
    let overall = level(
        field(obj, &["Wartość indeksu"]),
        text_field(obj, &["Nazwa kategorii indeksu"]).as_deref(),
    )?;
    let source_data_at = timestamp(
        field(
            obj,
            &["Data danych źródłowych, z których policzono wartość indeksu dla wskaźnika st"],
        ),
        zone,
    )?;

    let mut sub_indices = Vec::new();
    for (key, value) in obj {
        let Some(code) = key.strip_prefix(SUB_VALUE_PREFIX) else {
            continue;
        };

        let name = SUB_NAME_PREFIXES
            .iter()
            .find_map(|prefix| text_field(obj, &[format!("{prefix}{code}").as_str()]));

        sub_indices.push(SubIndex {
            parameter: code.to_string(),
            level: level(Some(value), name.as_deref())?,
            calculated_at: timestamp(obj.get(&format!("{SUB_CALC_PREFIX}{code}")), zone)?,
            source_data_at: timestamp(obj.get(&format!("{SUB_SOURCE_PREFIX}{code}")), zone)?,
        });
    }
    sub_indices.sort_by(|a, b| a.parameter.cmp(&b.parameter));

    Ok(AirQualityIndex {
        station_id,
        calculated_at,
        level: overall,
        sub_indices,
        source_data_at,
    })
}

fn parse_index_legacy(
    obj: &Map<String, Value>,
    station_id: StationId,
    zone: SourceZone,
) -> WireResult<AirQualityIndex> {
    let station_id = optional_id(field(obj, &["id"]))?.unwrap_or(station_id);
    let calculated_at = timestamp(field(obj, &["stCalcDate"]), zone)?
        .ok_or(ParseError::MissingField("stCalcDate"))?;
    let level = legacy_level(obj.get("stIndexLevel"))?;
    let source_data_at = timestamp(field(obj, &["stSourceDataDate"]), zone)?;

    let mut sub_indices = Vec::new();
    for (key, value) in obj {
        let Some(prefix) = key.strip_suffix("IndexLevel") else {
            continue;
        };
        if prefix == "st" || prefix.is_empty() {
            continue;
        }

        sub_indices.push(SubIndex {
            parameter: legacy_parameter_code(prefix),
            level: legacy_level(Some(value))?,
            calculated_at: timestamp(obj.get(&format!("{prefix}CalcDate")), zone)?,
            source_data_at: timestamp(obj.get(&format!("{prefix}SourceDataDate")), zone)?,
        });
    }
    sub_indices.sort_by(|a, b| a.parameter.cmp(&b.parameter));

    Ok(AirQualityIndex {
        station_id,
        calculated_at,
        level,
        sub_indices,
        source_data_at,
    })
}

fn legacy_level(value: Option<&Value>) -> WireResult<Option<IndexLevel>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(level_obj)) => level(
            field(level_obj, &["id"]),
            text_field(level_obj, &["indexLevelName"]).as_deref(),
        ),
        Some(other) => Err(WireError::Shape(format!(
            "index level must be an object, got {other}"
        ))),
    }
}

fn legacy_parameter_code(prefix: &str) -> String {
    match prefix {
        "pm25" => "PM2.5".to_string(),
        other => other.to_uppercase(),
    }
}

// === Leaf helpers ===

fn level(value: Option<&Value>, name: Option<&str>) -> WireResult<Option<IndexLevel>> {
    match optional_id(value)? {
        Some(raw) => Ok(IndexLevel::from_wire(raw, name)?),
        None => Ok(None),
    }
}

/// Extract the item list from a bare array or a wrapping object.
fn list<'a>(body: &'a Value, keys: &[&str]) -> WireResult<&'a Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(obj) => match field(obj, keys) {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(WireError::Shape(format!(
                "expected a list, got {}",
                kind(other)
            ))),
            None => Err(WireError::Shape(format!(
                "none of {:?} present (keys: {:?})",
                keys,
                obj.keys().collect::<Vec<_>>()
            ))),
        },
        other => Err(WireError::Shape(format!(
            "expected an array or object, got {}",
            kind(other)
        ))),
    }
}

fn object<'a>(value: &'a Value, what: &str) -> WireResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| WireError::Shape(format!("{what} must be an object, got {}", kind(value))))
}

/// First non-null value among the candidate keys.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(obj, keys).and_then(|value| match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number(value: Option<&Value>) -> WireResult<Option<f64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or_else(|| ParseError::InvalidNumber(n.to_string()).into()),
        Some(Value::String(s)) => Ok(text::parse_value(s)?),
        Some(other) => Err(ParseError::InvalidNumber(other.to_string()).into()),
    }
}

fn optional_id(value: Option<&Value>) -> WireResult<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ParseError::InvalidNumber(n.to_string()).into()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(text::parse_id(s)?)),
        Some(other) => Err(ParseError::InvalidNumber(other.to_string()).into()),
    }
}

fn required_id(
    obj: &Map<String, Value>,
    keys: &[&str],
    what: &'static str,
) -> WireResult<i64> {
    optional_id(field(obj, keys))?.ok_or_else(|| ParseError::MissingField(what).into())
}

fn timestamp(value: Option<&Value>, zone: SourceZone) -> WireResult<Option<OffsetDateTime>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(text::parse_timestamp(s, zone)?)),
        Some(other) => Err(ParseError::InvalidTimestamp(other.to_string()).into()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    const WARSAW: SourceZone = SourceZone::WARSAW;

    #[test]
    fn test_stations_v1_format() {
        let body = json!({
            "Lista stacji pomiarowych": [{
                "Identyfikator stacji": 52,
                "Kod stacji": "MpKrakAlKras",
                "Nazwa stacji": "Kraków, Aleja Krasińskiego",
                "WGS84 φ N": "50.057678",
                "Szerokość geograficzna": "50.057678",
                "Długość geograficzna": "19.926189",
                "Identyfikator miasta": 415,
                "Nazwa miasta": "Kraków",
                "Gmina": "Kraków",
                "Powiat": "Kraków",
                "Województwo": "MAŁOPOLSKIE",
                "Ulica": "al. Krasińskiego"
            }]
        });

        let stations = parse_stations(&body).unwrap();
        assert_eq!(stations.len(), 1);
        let station = &stations[0];
        assert_eq!(station.id, 52);
        assert_eq!(station.name, "Kraków, Aleja Krasińskiego");
        assert_eq!(station.latitude, Some(50.057678));
        assert_eq!(station.address.city.as_deref(), Some("Kraków"));
        assert_eq!(station.address.province.as_deref(), Some("MAŁOPOLSKIE"));
        assert_eq!(station.address.street.as_deref(), Some("al. Krasińskiego"));
    }

    #[test]
    fn test_stations_legacy_format() {
        let body = json!([{
            "id": 14,
            "stationName": "Działoszyn",
            "gegrLat": "50.972167",
            "gegrLon": "14.941319",
            "city": {
                "id": 192,
                "name": "Działoszyn",
                "commune": {
                    "communeName": "Bogatynia",
                    "districtName": "zgorzelecki",
                    "provinceName": "DOLNOŚLĄSKIE"
                }
            },
            "addressStreet": null
        }]);

        let stations = parse_stations(&body).unwrap();
        let station = &stations[0];
        assert_eq!(station.id, 14);
        assert_eq!(station.longitude, Some(14.941319));
        assert_eq!(station.address.commune.as_deref(), Some("Bogatynia"));
        assert_eq!(station.address.district.as_deref(), Some("zgorzelecki"));
        assert!(station.address.street.is_none());
    }

    #[test]
    fn test_station_without_name_is_rejected() {
        let body = json!([{ "id": 14 }]);
        assert_eq!(
            parse_stations(&body),
            Err(WireError::Value(ParseError::MissingField("station name")))
        );
    }

    #[test]
    fn test_sensors_both_formats() {
        let v1 = json!({
            "Lista stanowisk pomiarowych dla podanej stacji": [{
                "Identyfikator stanowiska": 16784,
                "Identyfikator stacji": 52,
                "Wskaźnik": "pył zawieszony PM10",
                "Wskaźnik - wzór": "PM10",
                "Wskaźnik - kod": "PM10",
                "Id wskaźnika": 3
            }]
        });
        let sensors = parse_sensors(&v1, 52).unwrap();
        assert_eq!(sensors[0].id, 16784);
        assert_eq!(sensors[0].parameter.code, "PM10");
        assert_eq!(sensors[0].parameter.id, Some(3));

        let legacy = json!([{
            "id": 92,
            "param": {
                "paramName": "dwutlenek azotu",
                "paramFormula": "NO2",
                "paramCode": "NO2",
                "idParam": 6
            }
        }]);
        let sensors = parse_sensors(&legacy, 14).unwrap();
        assert_eq!(sensors[0].station_id, 14);
        assert_eq!(sensors[0].parameter.formula, "NO2");
    }

    #[test]
    fn test_series_sorted_and_nulls_absent() {
        let body = json!({
            "Lista danych pomiarowych": [
                { "Kod stanowiska": "MpKrakAlKras-PM10-1g", "Data": "2024-03-01 12:00:00", "Wartość": null },
                { "Kod stanowiska": "MpKrakAlKras-PM10-1g", "Data": "2024-03-01 11:00:00", "Wartość": 41.2 },
                { "Kod stanowiska": "MpKrakAlKras-PM10-1g", "Data": "2024-03-01 10:00:00", "Wartość": "38,5" },
                { "Kod stanowiska": "MpKrakAlKras-PM10-1g", "Data": "2024-03-01 09:00:00" }
            ]
        });

        let samples = parse_series(&body, 16784, WARSAW).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].timestamp, datetime!(2024-03-01 08:00 UTC));
        assert!(samples[0].value.is_none());
        assert_eq!(samples[1].value, Some(38.5));
        assert_eq!(samples[2].value, Some(41.2));
        assert!(samples[3].value.is_none());
        assert!(samples.iter().all(|s| s.sensor_id == 16784));
    }

    #[test]
    fn test_series_summer_time_is_cest() {
        let body = json!({
            "Lista danych pomiarowych": [
                { "Data": "2024-07-01 13:00:00", "Wartość": 12.0 },
                { "Data": "2024-07-01 12:00:00", "Wartość": 11.0 }
            ]
        });

        let samples = parse_series(&body, 92, WARSAW).unwrap();
        assert_eq!(samples[0].timestamp, datetime!(2024-07-01 10:00 UTC));
        assert_eq!(samples[1].timestamp, datetime!(2024-07-01 11:00 UTC));
    }

    #[test]
    fn test_series_legacy_duplicate_last_wins() {
        let body = json!({
            "key": "NO2",
            "values": [
                { "date": "2024-03-01 10:00:00", "value": 1.0 },
                { "date": "2024-03-01 10:00:00", "value": 2.0 },
                { "date": "2024-03-01 11:00:00", "value": "" }
            ]
        });

        let samples = parse_series(&body, 92, WARSAW).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value, Some(2.0));
        assert!(samples[1].value.is_none());
    }

    #[test]
    fn test_series_rejects_garbage_value() {
        let body = json!({ "values": [{ "date": "2024-03-01 10:00:00", "value": "n/a" }] });
        assert!(matches!(
            parse_series(&body, 92, WARSAW),
            Err(WireError::Value(ParseError::InvalidNumber(_)))
        ));
    }

    #[test]
    fn test_series_rejects_unknown_shape() {
        let body = json!({ "error": "not found" });
        assert!(matches!(
            parse_series(&body, 92, WARSAW),
            Err(WireError::Shape(_))
        ));
        assert!(matches!(
            parse_series(&json!("oops"), 92, WARSAW),
            Err(WireError::Shape(_))
        ));
    }

    #[test]
    fn test_empty_series_is_ok() {
        let body = json!({ "Lista danych pomiarowych": [] });
        assert!(parse_series(&body, 92, WARSAW).unwrap().is_empty());
    }

    #[test]
    fn test_index_v1_format() {
        let body = json!({
            "AqIndex": {
                "Identyfikator stacji pomiarowej": 52,
                "Data wykonania obliczeń indeksu": "2024-03-01 13:20:14",
                "Wartość indeksu": 1,
                "Nazwa kategorii indeksu": "Dobry",
                "Data danych źródłowych, z których policzono wartość indeksu dla wskaźnika st": "2024-03-01 13:00:00",
                "Wartość indeksu dla wskaźnika PM10": 1,
                "Nazwa kategorii indeksu dla wskażnika PM10": "Dobry",
                "Data wykonania obliczeń indeksu dla wskaźnika PM10": "2024-03-01 13:20:14",
                "Wartość indeksu dla wskaźnika NO2": 0,
                "Nazwa kategorii indeksu dla wskażnika NO2": "Bardzo dobry",
                "Wartość indeksu dla wskaźnika O3": null,
                "Status indeksu ogólnego dla stacji pomiarowej": true
            }
        });

        let index = parse_index(&body, 52, WARSAW).unwrap();
        assert_eq!(index.station_id, 52);
        assert_eq!(index.calculated_at, datetime!(2024-03-01 12:20:14 UTC));
        assert_eq!(index.level_name(), Some("Dobry"));
        assert_eq!(index.source_data_at, Some(datetime!(2024-03-01 12:00 UTC)));
        assert_eq!(index.sub_indices.len(), 3);

        let pm10 = index.sub_index("PM10").unwrap();
        assert_eq!(pm10.level.as_ref().map(|l| l.value), Some(1));
        assert!(pm10.calculated_at.is_some());
        assert_eq!(
            index.sub_index("NO2").and_then(|s| s.level.as_ref()).map(|l| l.name.as_str()),
            Some("Bardzo dobry")
        );
        assert!(index.sub_index("O3").unwrap().level.is_none());
    }

    #[test]
    fn test_index_v1_overall_and_sub_levels_differ() {
        let body = json!({
            "AqIndex": {
                "Data wykonania obliczeń indeksu": "2024-07-01 13:20:14",
                "Wartość indeksu": 3,
                "Nazwa kategorii indeksu": "Dostateczny",
                "Wartość indeksu dla wskaźnika O3": 3,
                "Wartość indeksu dla wskaźnika PM10": 1
            }
        });

        let index = parse_index(&body, 52, WARSAW).unwrap();
        assert_eq!(index.level.as_ref().map(|l| l.value), Some(3));
        assert_eq!(index.level_name(), Some("Dostateczny"));
        assert_eq!(index.calculated_at, datetime!(2024-07-01 11:20:14 UTC));
        let pm10 = index.sub_index("PM10").and_then(|s| s.level.as_ref());
        assert_eq!(pm10.map(|l| l.value), Some(1));
    }

    #[test]
    fn test_index_legacy_format() {
        let body = json!({
            "id": 14,
            "stCalcDate": "2024-03-01 13:20:14",
            "stIndexLevel": { "id": 2, "indexLevelName": "Umiarkowany" },
            "stSourceDataDate": "2024-03-01 13:00:00",
            "so2CalcDate": "2024-03-01 13:20:14",
            "so2IndexLevel": { "id": 0, "indexLevelName": "Bardzo dobry" },
            "pm25IndexLevel": { "id": 2, "indexLevelName": "Umiarkowany" },
            "o3IndexLevel": null,
            "stIndexStatus": true
        });

        let index = parse_index(&body, 14, WARSAW).unwrap();
        assert_eq!(index.level.as_ref().map(|l| l.value), Some(2));
        assert_eq!(index.sub_indices.len(), 3);
        assert!(index.sub_index("PM2.5").is_some());
        assert!(index.sub_index("SO2").unwrap().calculated_at.is_some());
        assert!(index.sub_index("O3").unwrap().level.is_none());
    }

    #[test]
    fn test_index_missing_level_is_absent() {
        let body = json!({
            "id": 14,
            "stCalcDate": "2024-03-01 13:20:14",
            "stIndexLevel": { "id": -1, "indexLevelName": "Brak indeksu" }
        });
        let index = parse_index(&body, 14, WARSAW).unwrap();
        assert!(index.level.is_none());
        assert!(index.sub_indices.is_empty());
    }

    #[test]
    fn test_index_out_of_range_level_rejected() {
        let body = json!({
            "id": 14,
            "stCalcDate": "2024-03-01 13:20:14",
            "stIndexLevel": { "id": 9, "indexLevelName": "?" }
        });
        assert!(parse_index(&body, 14, WARSAW).is_err());
    }
}
