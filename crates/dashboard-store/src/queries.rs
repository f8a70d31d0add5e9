//! Query builders for readings and bucketed aggregates.
//!
//! [`ReadingQuery`] is a fluent builder for paging through raw readings;
//! [`AggregateQuery`] describes a time range and a bucket width.
//!
//! # Example
//!
//! ```
//! use dashboard_store::{AggregateQuery, ReadingQuery, Store};
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_in_memory()?;
//! let now = OffsetDateTime::now_utc();
//!
//! // Second page of ten, newest first
//! let page = store.query_readings(&ReadingQuery::new().limit(10).offset(10))?;
//!
//! // Hourly averages over the last day
//! let query = AggregateQuery::new(now - Duration::days(1), now, Duration::hours(1))?;
//! let buckets = store.aggregate(&query)?;
//! # Ok::<(), dashboard_store::Error>(())
//! ```

use time::{Duration, OffsetDateTime};

use crate::error::{Error, Result};
use crate::models::to_unix_nanos;

/// Fluent query builder for readings.
///
/// Use this to construct queries for [`Store::query_readings`](crate::Store::query_readings).
/// All filter methods are optional and can be chained in any order.
///
/// By default, queries return results ordered by `recorded_at` descending
/// (newest first). Rows sharing a timestamp are ordered by `id` in the same
/// direction, so consecutive `limit`/`offset` pages never overlap or skip.
///
/// # Example
///
/// ```
/// use dashboard_store::ReadingQuery;
/// use time::{OffsetDateTime, Duration};
///
/// let now = OffsetDateTime::now_utc();
///
/// // Last hour's readings
/// let query = ReadingQuery::new()
///     .since(now - Duration::hours(1))
///     .limit(100);
///
/// // Page 2 with 10 rows per page
/// let page_2 = ReadingQuery::new().limit(10).offset(10);
///
/// // Chronological order
/// let chronological = ReadingQuery::new().oldest_first();
/// ```
#[derive(Debug, Default, Clone)]
pub struct ReadingQuery {
    /// Filter readings at or after this time.
    pub since: Option<OffsetDateTime>,
    /// Filter readings at or before this time.
    pub until: Option<OffsetDateTime>,
    /// Maximum number of results.
    pub limit: Option<u64>,
    /// Offset for pagination.
    pub offset: Option<u64>,
    /// Order by recorded_at descending (newest first).
    pub newest_first: bool,
}

impl ReadingQuery {
    /// Create a new query with default settings.
    ///
    /// Default behavior:
    /// - No time range filter
    /// - No limit (all matching records)
    /// - Ordered by newest first
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    /// Filter to readings recorded at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Filter to readings recorded at or before this time.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Limit the maximum number of results returned.
    ///
    /// Use with `offset()` for pagination.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results.
    ///
    /// Use with `limit()` for pagination. For example, to get page 2
    /// with 50 items per page: `.limit(50).offset(50)`.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Order results by oldest first (ascending by `recorded_at`).
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> Result<(String, Vec<Box<dyn rusqlite::ToSql>>)> {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(since) = self.since {
            conditions.push("recorded_at >= ?");
            params.push(Box::new(to_unix_nanos(since)?));
        }

        if let Some(until) = self.until {
            conditions.push("recorded_at <= ?");
            params.push(Box::new(to_unix_nanos(until)?));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        Ok((where_clause, params))
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> Result<String> {
        let (where_clause, _) = self.build_where()?;
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT id, recorded_at, temperature, humidity \
             FROM readings {} ORDER BY recorded_at {}, id {}",
            where_clause, order, order
        );

        // SQLite only accepts OFFSET after a LIMIT; -1 means "no limit".
        match (self.limit, self.offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", clamp_to_i64(limit))),
            (None, Some(_)) => sql.push_str(" LIMIT -1"),
            (None, None) => {}
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", clamp_to_i64(offset)));
        }

        Ok(sql)
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// A bucketed aggregate over a closed time range.
///
/// Both `from` and `to` are inclusive. Buckets start at
/// `floor(t / width) * width` measured from the Unix epoch, so two queries
/// with the same width always agree on bucket boundaries regardless of
/// where their ranges begin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateQuery {
    /// Start of the range (inclusive).
    pub from: OffsetDateTime,
    /// End of the range (inclusive).
    pub to: OffsetDateTime,
    /// Bucket width.
    pub width: Duration,
}

impl AggregateQuery {
    /// Create an aggregate query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBucketWidth`] if `width` is not positive or does
    /// not fit in i64 nanoseconds.
    pub fn new(from: OffsetDateTime, to: OffsetDateTime, width: Duration) -> Result<Self> {
        let query = Self { from, to, width };
        query.width_nanos()?;
        Ok(query)
    }

    /// Bucket width in nanoseconds.
    pub(crate) fn width_nanos(&self) -> Result<i64> {
        if !self.width.is_positive() {
            return Err(Error::InvalidBucketWidth(format!(
                "width must be positive, got {}",
                self.width
            )));
        }
        i64::try_from(self.width.whole_nanoseconds())
            .map_err(|_| Error::InvalidBucketWidth(format!("width {} is too large", self.width)))
    }

    /// Build the aggregate SQL. Parameters are `(width_ns, from_ns, to_ns)`.
    ///
    /// SQLite integer division truncates toward zero, so a negative remainder
    /// moves the quotient down by one to get floor semantics.
    pub(crate) fn build_sql(&self) -> &'static str {
        "SELECT bucket, AVG(temperature), AVG(humidity), COUNT(*)
         FROM (
             SELECT (recorded_at / ?1 - (recorded_at % ?1 < 0)) * ?1 AS bucket,
                    temperature,
                    humidity
             FROM readings
             WHERE recorded_at BETWEEN ?2 AND ?3
         )
         GROUP BY bucket
         ORDER BY bucket ASC"
    }
}
