//! Query builder for stored measurement series.
//!
//! # Example
//!
//! ```
//! use airq_store::{SampleQuery, Store};
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_in_memory()?;
//! let now = OffsetDateTime::now_utc();
//!
//! // Last 15 hours for a sensor, chronological
//! let query = SampleQuery::new(92)
//!     .since(now - Duration::hours(15))
//!     .until(now);
//! let samples = store.query_samples(&query)?;
//! assert!(samples.is_empty());
//! # Ok::<(), airq_store::Error>(())
//! ```

use airq_types::SensorId;
use time::OffsetDateTime;

/// Fluent query builder for a sensor's samples.
///
/// Use this to construct queries for [`Store::query_samples`](crate::Store::query_samples).
/// Both time bounds are inclusive. Results are ordered by timestamp
/// ascending (chronological).
#[derive(Debug, Clone)]
pub struct SampleQuery {
    /// Sensor to read.
    pub sensor_id: SensorId,
    /// Include only samples at or after this time.
    pub since: Option<OffsetDateTime>,
    /// Include only samples at or before this time.
    pub until: Option<OffsetDateTime>,
}

impl SampleQuery {
    /// Create a query for all stored samples of a sensor, oldest first.
    pub fn new(sensor_id: SensorId) -> Self {
        Self {
            sensor_id,
            since: None,
            until: None,
        }
    }

    /// Filter to samples at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Filter to samples at or before this time.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = vec!["sensor_id = ?"];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(self.sensor_id)];

        if let Some(since) = self.since {
            conditions.push("timestamp >= ?");
            params.push(Box::new(since.unix_timestamp()));
        }

        if let Some(until) = self.until {
            conditions.push("timestamp <= ?");
            params.push(Box::new(until.unix_timestamp()));
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        format!(
            "SELECT sensor_id, timestamp, value FROM samples {} ORDER BY timestamp ASC",
            where_clause
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_sample_query_defaults() {
        let query = SampleQuery::new(7);
        assert_eq!(query.sensor_id, 7);
        assert!(query.since.is_none());
        assert!(query.until.is_none());

        let sql = query.build_sql();
        assert!(sql.contains("WHERE sensor_id = ?"));
        assert!(sql.ends_with("ORDER BY timestamp ASC"));
    }

    #[test]
    fn test_sample_query_range() {
        let query = SampleQuery::new(7)
            .since(datetime!(2024-03-01 0:00 UTC))
            .until(datetime!(2024-03-02 0:00 UTC));

        let (where_clause, params) = query.build_where();
        assert_eq!(params.len(), 3);
        assert!(where_clause.contains("timestamp >= ?"));
        assert!(where_clause.contains("timestamp <= ?"));
        assert!(query.build_sql().ends_with("ORDER BY timestamp ASC"));
    }
}
