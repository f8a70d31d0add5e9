//! Main store implementation.

use std::path::Path;
use std::time::Duration as StdDuration;

use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{Bucket, NewReading, StoredReading, from_unix_nanos, to_unix_nanos};
use crate::queries::{AggregateQuery, ReadingQuery};
use crate::schema;

/// Default wait for a write lock held by another connection.
pub const DEFAULT_BUSY_TIMEOUT: StdDuration = StdDuration::from_millis(5000);

/// Options applied when opening a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// How long a statement waits for a lock held by another writer before
    /// failing with a busy error. Never infinite.
    pub busy_timeout: StdDuration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// SQLite-based, append-only store for sensor readings.
///
/// The store is the only writer of the reading set. Rows are never updated
/// or deleted, so readers only ever observe whole rows.
pub struct Store {
    conn: Connection,
    busy_timeout: StdDuration,
}

impl Store {
    /// Open or create a database at the given path with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, StoreOptions::default())
    }

    /// Open or create a database at the given path.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: StoreOptions) -> Result<Self> {
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

        // WAL lets readers proceed while a write is in progress
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Self::from_connection(conn, options)
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, StoreOptions::default())
    }

    fn from_connection(conn: Connection, options: StoreOptions) -> Result<Self> {
        conn.busy_timeout(options.busy_timeout)?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            busy_timeout: options.busy_timeout,
        })
    }

    /// The configured wait bound for locks held by other writers.
    pub fn busy_timeout(&self) -> StdDuration {
        self.busy_timeout
    }
}

fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<StoredReading> {
    Ok(StoredReading {
        id: row.get(0)?,
        recorded_at: timestamp_column(row, 1)?,
        temperature: row.get(2)?,
        humidity: row.get(3)?,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let nanos: i64 = row.get(idx)?;
    from_unix_nanos(nanos)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

// Reading operations
impl Store {
    /// Append a reading and return its row ID.
    ///
    /// No deduplication or range checks are performed; the value is stored
    /// exactly as given.
    pub fn insert_reading(&self, reading: &NewReading) -> Result<i64> {
        let recorded_at = reading.recorded_at.unwrap_or_else(OffsetDateTime::now_utc);

        self.conn.execute(
            "INSERT INTO readings (recorded_at, temperature, humidity) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                to_unix_nanos(recorded_at)?,
                reading.temperature,
                reading.humidity
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted reading {} at {}", id, recorded_at);
        Ok(id)
    }

    /// Query readings with filters.
    pub fn query_readings(&self, query: &ReadingQuery) -> Result<Vec<StoredReading>> {
        let sql = query.build_sql()?;
        let (_, params) = query.build_where()?;

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let readings = stmt
            .query_map(params_ref.as_slice(), reading_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(readings)
    }

    /// One page of readings, newest first.
    ///
    /// Returns an empty vector when `offset` is past the last row.
    pub fn list_readings(&self, limit: u64, offset: u64) -> Result<Vec<StoredReading>> {
        self.query_readings(&ReadingQuery::new().limit(limit).offset(offset))
    }

    /// Average readings into epoch-aligned buckets, oldest bucket first.
    ///
    /// Only buckets with at least one reading are returned; gaps are not
    /// filled with zero-valued buckets.
    pub fn aggregate(&self, query: &AggregateQuery) -> Result<Vec<Bucket>> {
        let width = query.width_nanos()?;
        let from = to_unix_nanos(query.from)?;
        let to = to_unix_nanos(query.to)?;

        debug!(
            "Aggregating {} to {} in buckets of {}",
            query.from, query.to, query.width
        );

        let mut stmt = self.conn.prepare(query.build_sql())?;
        let buckets = stmt
            .query_map(rusqlite::params![width, from, to], |row| {
                Ok(Bucket {
                    start: timestamp_column(row, 0)?,
                    avg_temperature: row.get(1)?,
                    avg_humidity: row.get(2)?,
                    reading_count: row.get::<_, i64>(3)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(buckets)
    }

    /// Instant of the most recent reading, or `None` if the store is empty.
    pub fn last_updated(&self) -> Result<Option<OffsetDateTime>> {
        let nanos: Option<i64> =
            self.conn
                .query_row("SELECT MAX(recorded_at) FROM readings", [], |row| {
                    row.get(0)
                })?;

        nanos
            .map(|n| {
                from_unix_nanos(n).map_err(|e| Error::InvalidTimestamp(e.to_string()))
            })
            .transpose()
    }

    /// Count all stored readings.
    pub fn count_readings(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;

        Ok(count as u64)
    }
}
