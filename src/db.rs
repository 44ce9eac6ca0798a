/// Data access layer over the pre-populated climate dataset.
///
/// The dataset is a read-only SQLite file with two tables, prepared by an
/// external loading process:
///
/// - `measurement` — station code, observation date (`YYYY-MM-DD` text),
///   precipitation (nullable), temperature observation
/// - `station` — station code, name, latitude, longitude, elevation
///
/// [`ClimateStore`] is constructed once at startup and validates the dataset
/// (file present, tables present) so a misconfigured path fails the process
/// before it ever binds a socket. Each request then opens a scoped
/// [`DataSession`] — a short-lived read-only connection released on drop on
/// every exit path, including query failure.

use chrono::{Duration, NaiveDate};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::model::{DATE_FORMAT, PrecipReading, StationRecord, TempReading, TemperatureSummary};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Data access failure modes.
#[derive(Debug)]
pub enum DataError {
    /// Dataset file does not exist at the configured path. Fatal at startup.
    DatasetMissing(PathBuf),
    /// SQLite could not open the dataset file. Fatal at startup.
    OpenFailed(PathBuf, rusqlite::Error),
    /// A required table is absent from the dataset. Fatal at startup.
    MissingTable(String),
    /// The measurement table has zero rows, so there is no last observation
    /// date to anchor the rolling-year window on. Degraded but serving.
    EmptyDataset,
    /// A stored measurement date is not in `YYYY-MM-DD` form.
    BadDate(String),
    /// Engine-level fault while executing a request-time query.
    Query(rusqlite::Error),
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::DatasetMissing(path) => {
                write!(f, "Climate dataset not found at {}.\n\n", path.display())?;
                write!(f, "  The dataset is prepared out-of-band; this service never creates it.\n")?;
                write!(f, "  Point CLIMATE_DB (or [service].database_path in climate.toml)\n")?;
                write!(f, "  at an existing SQLite file with measurement and station tables.")
            }
            DataError::OpenFailed(path, e) => {
                write!(f, "Failed to open climate dataset at {}.\n\n", path.display())?;
                write!(f, "  Error: {}", e)
            }
            DataError::MissingTable(table) => {
                write!(f, "Climate dataset is missing required table '{}'.\n\n", table)?;
                write!(f, "  Expected tables: measurement, station.\n")?;
                write!(f, "  The configured file is probably not a climate dataset.")
            }
            DataError::EmptyDataset => {
                write!(f, "Measurement table contains no rows")
            }
            DataError::BadDate(date) => {
                write!(f, "Measurement date '{}' is not in YYYY-MM-DD form", date)
            }
            DataError::Query(e) => {
                write!(f, "Query failed: {}", e)
            }
        }
    }
}

impl std::error::Error for DataError {}

impl From<rusqlite::Error> for DataError {
    fn from(e: rusqlite::Error) -> Self {
        DataError::Query(e)
    }
}

// ---------------------------------------------------------------------------
// Store handle
// ---------------------------------------------------------------------------

/// Handle to the climate dataset, constructed once at startup and passed
/// explicitly to request handlers. Holds only the dataset path; connections
/// are opened per request.
#[derive(Debug, Clone)]
pub struct ClimateStore {
    path: PathBuf,
}

impl ClimateStore {
    /// Opens the store with startup validation: the dataset file must exist,
    /// be openable, and contain both expected tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(DataError::DatasetMissing(path));
        }

        let store = Self { path };

        // One throwaway session to verify the schema before serving.
        let session = store.session()?;
        for table in ["measurement", "station"] {
            if !session.table_exists(table)? {
                return Err(DataError::MissingTable(table.to_string()));
            }
        }

        Ok(store)
    }

    /// Dataset path this store reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a scoped read-only session. The connection is released when
    /// the session is dropped.
    pub fn session(&self) -> Result<DataSession, DataError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| DataError::OpenFailed(self.path.clone(), e))?;

        Ok(DataSession { conn })
    }
}

// ---------------------------------------------------------------------------
// Per-request session
// ---------------------------------------------------------------------------

/// A scoped read-only connection to the dataset. Lives for one request.
pub struct DataSession {
    conn: Connection,
}

impl DataSession {
    /// All (date, precipitation) pairs in the dataset, unfiltered. No
    /// ordering is requested; callers that need one must sort or map.
    pub fn all_precipitation(&self) -> Result<Vec<PrecipReading>, DataError> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, prcp FROM measurement")?;

        let rows = stmt.query_map([], |row| {
            Ok(PrecipReading {
                date: row.get(0)?,
                prcp: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every station in the directory, one record per station.
    pub fn all_stations(&self) -> Result<Vec<StationRecord>, DataError> {
        let mut stmt = self.conn.prepare(
            "SELECT station, name, latitude, longitude, elevation FROM station",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(StationRecord {
                station: row.get(0)?,
                name: row.get(1)?,
                latitude: row.get(2)?,
                longitude: row.get(3)?,
                elevation: row.get(4)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The most recent observation date in the measurement table.
    ///
    /// `MAX` on the `YYYY-MM-DD` text column is correct because that format
    /// sorts lexically in chronological order.
    pub fn last_observation_date(&self) -> Result<String, DataError> {
        let latest: Option<String> = self
            .conn
            .query_row("SELECT MAX(date) FROM measurement", [], |row| row.get(0))?;

        latest.ok_or(DataError::EmptyDataset)
    }

    /// (date, temperature) pairs with date in the closed range
    /// `[start, end]`, ordered ascending by date. An omitted end leaves the
    /// range unbounded above.
    pub fn observations_in_range(
        &self,
        start: &str,
        end: Option<&str>,
    ) -> Result<Vec<TempReading>, DataError> {
        let mut rows = Vec::new();
        match end {
            Some(end) => {
                let mut stmt = self.conn.prepare(
                    "SELECT date, tobs FROM measurement
                     WHERE date >= ?1 AND date <= ?2
                     ORDER BY date ASC",
                )?;
                for reading in stmt.query_map([start, end], row_to_temp_reading)? {
                    rows.push(reading?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT date, tobs FROM measurement
                     WHERE date >= ?1
                     ORDER BY date ASC",
                )?;
                for reading in stmt.query_map([start], row_to_temp_reading)? {
                    rows.push(reading?);
                }
            }
        }

        Ok(rows)
    }

    /// Minimum, average, and maximum temperature over the closed range
    /// `[start, end]`. All three fields are null when no rows match — the
    /// aggregate query always yields exactly one row either way.
    pub fn temperature_summary(
        &self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureSummary, DataError> {
        let summary = match end {
            Some(end) => self.conn.query_row(
                "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement
                 WHERE date >= ?1 AND date <= ?2",
                [start, end],
                row_to_summary,
            )?,
            None => self.conn.query_row(
                "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement
                 WHERE date >= ?1",
                [start],
                row_to_summary,
            )?,
        };

        Ok(summary)
    }

    fn table_exists(&self, table: &str) -> Result<bool, DataError> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }
}

/// Converts a measurement row to a (date, temperature) reading.
fn row_to_temp_reading(row: &rusqlite::Row) -> rusqlite::Result<TempReading> {
    Ok(TempReading {
        date: row.get(0)?,
        tobs: row.get(1)?,
    })
}

/// Converts an aggregate row to the summary triple.
fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<TemperatureSummary> {
    Ok(TemperatureSummary {
        tmin: row.get(0)?,
        tavg: row.get(1)?,
        tmax: row.get(2)?,
    })
}

// ---------------------------------------------------------------------------
// Rolling-year window
// ---------------------------------------------------------------------------

/// Start of the rolling-year window: 52 weeks before the given date,
/// inclusive. For a last observation of 2017-08-23 the window starts at
/// 2016-08-24, so a `date >= start` filter keeps exactly one year of data.
///
/// Derived from the live maximum date on every request, never cached, so an
/// externally refreshed dataset moves the window without a restart.
pub fn rolling_year_start(last_date: &str) -> Result<String, DataError> {
    let parsed = NaiveDate::parse_from_str(last_date, DATE_FORMAT)
        .map_err(|_| DataError::BadDate(last_date.to_string()))?;

    Ok((parsed - Duration::weeks(52)).format(DATE_FORMAT).to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_year_start_is_52_weeks_back() {
        assert_eq!(rolling_year_start("2017-08-23").unwrap(), "2016-08-24");
    }

    #[test]
    fn test_rolling_year_start_crosses_leap_day() {
        // 52 weeks back from early 2017 lands in leap year 2016.
        assert_eq!(rolling_year_start("2017-02-28").unwrap(), "2016-03-01");
    }

    #[test]
    fn test_rolling_year_start_rejects_malformed_date() {
        assert!(rolling_year_start("not-a-date").is_err());
        assert!(rolling_year_start("2017/08/23").is_err());
    }

    #[test]
    fn test_open_fails_on_missing_dataset() {
        let result = ClimateStore::open("no/such/dataset.sqlite");
        match result {
            Err(DataError::DatasetMissing(path)) => {
                assert_eq!(path, PathBuf::from("no/such/dataset.sqlite"));
            }
            other => panic!("Expected DatasetMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_open_fails_on_wrong_schema() {
        // A valid SQLite file without the climate tables must be rejected.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE unrelated (id INTEGER);")
            .unwrap();
        drop(conn);

        match ClimateStore::open(&path) {
            Err(DataError::MissingTable(table)) => assert_eq!(table, "measurement"),
            other => panic!("Expected MissingTable, got {:?}", other),
        }
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let missing = DataError::DatasetMissing(PathBuf::from("Resources/hawaii.sqlite"));
        assert!(missing.to_string().contains("Resources/hawaii.sqlite"));

        let table = DataError::MissingTable("station".to_string());
        assert!(table.to_string().contains("station"));
    }
}
