//! Database schema and versioning.

use rusqlite::Connection;

use crate::error::{Error, Result};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
///
/// A database stamped with any other schema version is refused.
pub fn initialize(conn: &Connection) -> Result<()> {
    match get_schema_version(conn)? {
        0 => {
            // Fresh database - create all tables
            create_schema_v1(conn)?;
            set_schema_version(conn, SCHEMA_VERSION)
        }
        SCHEMA_VERSION => Ok(()),
        other => Err(Error::InvalidData(format!(
            "unsupported schema version {other} (expected {SCHEMA_VERSION})"
        ))),
    }
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Create the initial schema (version 1).
///
/// Sensors deliberately carry no foreign key to stations: dropping a station
/// row must leave its sensors addressable.
fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        -- Station catalog (replaced wholesale on each fetch)
        CREATE TABLE IF NOT EXISTS stations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            city TEXT,
            commune TEXT,
            district TEXT,
            province TEXT,
            street TEXT,
            fetched_at INTEGER NOT NULL
        );

        -- Measuring posts per station
        CREATE TABLE IF NOT EXISTS sensors (
            id INTEGER PRIMARY KEY,
            station_id INTEGER NOT NULL,
            param_id INTEGER,
            param_name TEXT NOT NULL,
            param_formula TEXT NOT NULL,
            param_code TEXT NOT NULL,
            fetched_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sensors_station
            ON sensors(station_id);

        -- Measurement series; NULL value = no reading in that slot
        CREATE TABLE IF NOT EXISTS samples (
            sensor_id INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            value REAL,
            synced_at INTEGER NOT NULL,
            PRIMARY KEY (sensor_id, timestamp)
        ) WITHOUT ROWID;

        -- Air-quality index snapshots, one per calculation timestamp
        CREATE TABLE IF NOT EXISTS aq_index (
            station_id INTEGER NOT NULL,
            calculated_at INTEGER NOT NULL,
            level INTEGER,
            level_name TEXT,
            source_data_at INTEGER,
            sub_indices TEXT NOT NULL,
            PRIMARY KEY (station_id, calculated_at)
        );
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in ["stations", "sensors", "samples", "aq_index", "schema_version"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_schema_version_tracking() {
        let conn = Connection::open_in_memory().unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), 0);

        initialize(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);

        // Re-initializing an up-to-date database is a no-op
        initialize(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_unknown_schema_version_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        set_schema_version(&conn, SCHEMA_VERSION + 1).unwrap();

        let err = initialize(&conn).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert!(err.to_string().contains("unsupported schema version 2"));
    }
}
