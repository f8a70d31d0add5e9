//! Data models for stored data.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Error, Result};

/// A reading stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    /// Database row ID, assigned in insertion order.
    pub id: i64,
    /// When this reading was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    /// Temperature in Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
}

/// A reading that has not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewReading {
    /// When the reading was taken. `None` means "at insertion time".
    pub recorded_at: Option<OffsetDateTime>,
    /// Temperature in Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
}

impl NewReading {
    /// Create a reading stamped with the insertion time.
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            recorded_at: None,
            temperature,
            humidity,
        }
    }

    /// Stamp the reading with an explicit time.
    pub fn at(mut self, recorded_at: OffsetDateTime) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }
}

/// Averages over one fixed-width, epoch-aligned time window.
///
/// Buckets are derived on query and never stored. A bucket only exists if at
/// least one reading falls in `[start, start + width)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Start of the window, a multiple of the width since the Unix epoch.
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    /// Mean temperature of the readings in the window.
    pub avg_temperature: f64,
    /// Mean humidity of the readings in the window.
    pub avg_humidity: f64,
    /// Number of readings that contributed.
    pub reading_count: u64,
}

pub(crate) fn to_unix_nanos(ts: OffsetDateTime) -> Result<i64> {
    i64::try_from(ts.unix_timestamp_nanos())
        .map_err(|_| Error::InvalidTimestamp(format!("{} is out of range", ts)))
}

pub(crate) fn from_unix_nanos(nanos: i64) -> std::result::Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
}
