//! Main store implementation.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;
use tracing::{debug, info};

use airq_types::{
    Address, AirQualityIndex, IndexLevel, Parameter, Sample, Sensor, SensorId, Station, StationId,
    SubIndex,
};

use crate::error::{Error, Result};
use crate::models::SeriesInfo;
use crate::queries::SampleQuery;
use crate::schema;

/// SQLite-based store for air-quality series and the station catalog.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }
}

fn from_unix(secs: i64, column: usize) -> rusqlite::Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(secs).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Integer,
            Box::new(e),
        )
    })
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<Sample> {
    Ok(Sample {
        sensor_id: row.get(0)?,
        timestamp: from_unix(row.get(1)?, 1)?,
        value: row.get(2)?,
    })
}

// Sample operations
impl Store {
    /// Insert or update samples for a sensor in a single transaction.
    ///
    /// Existing slots are overwritten only when the value differs, so the
    /// returned count covers inserted and changed rows. Every row is keyed by
    /// `sensor_id`, whatever the samples themselves carry.
    pub fn upsert_samples(&self, sensor_id: SensorId, samples: &[Sample]) -> Result<usize> {
        let synced_at = OffsetDateTime::now_utc().unix_timestamp();
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO samples (sensor_id, timestamp, value, synced_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(sensor_id, timestamp) DO UPDATE SET
                    value = excluded.value,
                    synced_at = excluded.synced_at
                 WHERE samples.value IS NOT excluded.value",
            )?;

            for sample in samples {
                written += stmt.execute(rusqlite::params![
                    sensor_id,
                    sample.timestamp.unix_timestamp(),
                    sample.value,
                    synced_at,
                ])?;
            }
        }

        tx.commit()?;

        info!(
            "Wrote {} of {} samples for sensor {}",
            written,
            samples.len(),
            sensor_id
        );
        Ok(written)
    }

    /// Query samples with filters.
    pub fn query_samples(&self, query: &SampleQuery) -> Result<Vec<Sample>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let samples = stmt
            .query_map(params_ref.as_slice(), sample_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(samples)
    }

    /// Newest stored timestamp for a sensor.
    pub fn latest_timestamp(&self, sensor_id: SensorId) -> Result<Option<OffsetDateTime>> {
        let secs: Option<i64> = self.conn.query_row(
            "SELECT MAX(timestamp) FROM samples WHERE sensor_id = ?",
            [sensor_id],
            |row| row.get(0),
        )?;

        secs.map(|s| {
            OffsetDateTime::from_unix_timestamp(s).map_err(|e| Error::InvalidTimestamp(e.to_string()))
        })
        .transpose()
    }

    /// Delete samples older than `retention_hours` before the sensor's newest
    /// stored timestamp. Returns the number of removed rows.
    pub fn prune_samples(&self, sensor_id: SensorId, retention_hours: u32) -> Result<usize> {
        let window = i64::from(retention_hours) * 3600;

        let removed = self.conn.execute(
            "DELETE FROM samples
             WHERE sensor_id = ?1
               AND timestamp < (SELECT MAX(timestamp) FROM samples WHERE sensor_id = ?1) - ?2",
            rusqlite::params![sensor_id, window],
        )?;

        if removed > 0 {
            debug!(
                "Pruned {} samples for sensor {} (retention {}h)",
                removed, sensor_id, retention_hours
            );
        }
        Ok(removed)
    }

    /// Oldest and newest stored timestamps for a sensor.
    pub fn sample_range(
        &self,
        sensor_id: SensorId,
    ) -> Result<Option<(OffsetDateTime, OffsetDateTime)>> {
        let bounds: (Option<i64>, Option<i64>) = self.conn.query_row(
            "SELECT MIN(timestamp), MAX(timestamp) FROM samples WHERE sensor_id = ?",
            [sensor_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        match bounds {
            (Some(oldest), Some(newest)) => {
                let convert = |s: i64| {
                    OffsetDateTime::from_unix_timestamp(s)
                        .map_err(|e| Error::InvalidTimestamp(e.to_string()))
                };
                Ok(Some((convert(oldest)?, convert(newest)?)))
            }
            _ => Ok(None),
        }
    }

    /// Count samples for one sensor or across all sensors.
    pub fn count_samples(&self, sensor_id: Option<SensorId>) -> Result<u64> {
        let count: i64 = match sensor_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM samples WHERE sensor_id = ?",
                [id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM samples", [], |row| row.get(0))?,
        };

        Ok(count as u64)
    }

    /// Per-sensor summary of every cached series.
    pub fn list_series(&self) -> Result<Vec<SeriesInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT sensor_id, COUNT(*), MIN(timestamp), MAX(timestamp), MAX(synced_at)
             FROM samples GROUP BY sensor_id ORDER BY sensor_id",
        )?;

        let series = stmt
            .query_map([], |row| {
                Ok(SeriesInfo {
                    sensor_id: row.get(0)?,
                    sample_count: row.get::<_, i64>(1)? as u64,
                    oldest: from_unix(row.get(2)?, 2)?,
                    newest: from_unix(row.get(3)?, 3)?,
                    last_synced_at: from_unix(row.get(4)?, 4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(series)
    }

    /// Render a sensor's samples as CSV, one row per slot.
    ///
    /// Absent values are written as empty cells.
    pub fn export_samples_csv(&self, query: &SampleQuery) -> Result<String> {
        let samples = self.query_samples(query)?;
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record(["sensor_id", "timestamp", "value"])?;
        for sample in &samples {
            let timestamp = sample
                .timestamp
                .format(&time::format_description::well_known::Rfc3339)
                .map_err(|e| Error::InvalidTimestamp(e.to_string()))?;
            let value = sample.value.map(|v| v.to_string()).unwrap_or_default();
            writer.write_record([sample.sensor_id.to_string(), timestamp, value])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        String::from_utf8(bytes).map_err(|e| Error::Io(std::io::Error::other(e)))
    }
}

// Catalog operations
impl Store {
    /// Insert or refresh station records.
    pub fn upsert_stations(&self, stations: &[Station]) -> Result<usize> {
        let fetched_at = OffsetDateTime::now_utc().unix_timestamp();
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO stations (id, name, latitude, longitude, city, commune,
                    district, province, street, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude,
                    city = excluded.city,
                    commune = excluded.commune,
                    district = excluded.district,
                    province = excluded.province,
                    street = excluded.street,
                    fetched_at = excluded.fetched_at",
            )?;

            for station in stations {
                written += stmt.execute(rusqlite::params![
                    station.id,
                    station.name,
                    station.latitude,
                    station.longitude,
                    station.address.city,
                    station.address.commune,
                    station.address.district,
                    station.address.province,
                    station.address.street,
                    fetched_at,
                ])?;
            }
        }

        tx.commit()?;
        info!("Cached {} stations", written);
        Ok(written)
    }

    /// All cached stations ordered by id.
    pub fn list_stations(&self) -> Result<Vec<Station>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, latitude, longitude, city, commune, district, province, street
             FROM stations ORDER BY id",
        )?;

        let stations = stmt
            .query_map([], |row| {
                Ok(Station {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    latitude: row.get(2)?,
                    longitude: row.get(3)?,
                    address: Address {
                        city: row.get(4)?,
                        commune: row.get(5)?,
                        district: row.get(6)?,
                        province: row.get(7)?,
                        street: row.get(8)?,
                    },
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(stations)
    }

    /// Insert or refresh sensor records.
    pub fn upsert_sensors(&self, sensors: &[Sensor]) -> Result<usize> {
        let fetched_at = OffsetDateTime::now_utc().unix_timestamp();
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO sensors (id, station_id, param_id, param_name, param_formula,
                    param_code, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    station_id = excluded.station_id,
                    param_id = excluded.param_id,
                    param_name = excluded.param_name,
                    param_formula = excluded.param_formula,
                    param_code = excluded.param_code,
                    fetched_at = excluded.fetched_at",
            )?;

            for sensor in sensors {
                written += stmt.execute(rusqlite::params![
                    sensor.id,
                    sensor.station_id,
                    sensor.parameter.id,
                    sensor.parameter.name,
                    sensor.parameter.formula,
                    sensor.parameter.code,
                    fetched_at,
                ])?;
            }
        }

        tx.commit()?;
        info!("Cached {} sensors", written);
        Ok(written)
    }

    /// Cached sensors of a station ordered by id.
    pub fn list_sensors(&self, station_id: StationId) -> Result<Vec<Sensor>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, station_id, param_id, param_name, param_formula, param_code
             FROM sensors WHERE station_id = ? ORDER BY id",
        )?;

        let sensors = stmt
            .query_map([station_id], |row| {
                Ok(Sensor {
                    id: row.get(0)?,
                    station_id: row.get(1)?,
                    parameter: Parameter {
                        id: row.get(2)?,
                        name: row.get(3)?,
                        formula: row.get(4)?,
                        code: row.get(5)?,
                    },
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sensors)
    }

    /// Delete a cached station record. Its sensors and series stay.
    pub fn delete_station(&self, station_id: StationId) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM stations WHERE id = ?", [station_id])?;
        Ok(removed > 0)
    }

    /// Store an index snapshot unless one with the same calculation time exists.
    ///
    /// Returns whether a new row was written.
    pub fn insert_index(&self, index: &AirQualityIndex) -> Result<bool> {
        let sub_indices = serde_json::to_string(&index.sub_indices)?;

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO aq_index (station_id, calculated_at, level, level_name,
                source_data_at, sub_indices)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                index.station_id,
                index.calculated_at.unix_timestamp(),
                index.level.as_ref().map(|l| l.value),
                index.level.as_ref().map(|l| l.name.as_str()),
                index.source_data_at.map(|t| t.unix_timestamp()),
                sub_indices,
            ],
        )?;

        if inserted > 0 {
            info!(
                "Stored index for station {} calculated at {}",
                index.station_id, index.calculated_at
            );
        }
        Ok(inserted > 0)
    }

    /// Most recently calculated index stored for a station.
    pub fn latest_index(&self, station_id: StationId) -> Result<Option<AirQualityIndex>> {
        let row = self
            .conn
            .query_row(
                "SELECT station_id, calculated_at, level, level_name, source_data_at, sub_indices
                 FROM aq_index WHERE station_id = ?
                 ORDER BY calculated_at DESC LIMIT 1",
                [station_id],
                |row| {
                    Ok((
                        row.get::<_, StationId>(0)?,
                        from_unix(row.get(1)?, 1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<i64>>(4)?
                            .map(|s| from_unix(s, 4))
                            .transpose()?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((station_id, calculated_at, level, level_name, source_data_at, sub_json)) = row
        else {
            return Ok(None);
        };

        let level = match level {
            Some(value) => IndexLevel::from_wire(value, level_name.as_deref())
                .map_err(|e| Error::InvalidData(e.to_string()))?,
            None => None,
        };
        let sub_indices: Vec<SubIndex> = serde_json::from_str(&sub_json)?;

        Ok(Some(AirQualityIndex {
            station_id,
            calculated_at,
            level,
            sub_indices,
            source_data_at,
        }))
    }
}
