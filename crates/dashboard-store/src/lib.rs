//! Append-only persistence for temperature/humidity readings.
//!
//! This crate provides SQLite-based storage for the home dashboard:
//! readings are inserted by a single writer and read back either as
//! newest-first pages or as epoch-aligned, averaged time buckets.
//!
//! # Features
//!
//! - Insert readings (timestamp defaults to "now")
//! - Page through readings newest first with `limit`/`offset`
//! - Aggregate readings into fixed-width buckets with inclusive bounds
//! - Look up the instant of the most recent write
//!
//! # Example
//!
//! ```no_run
//! use dashboard_store::{NewReading, ReadingQuery, Store};
//!
//! let store = Store::open_default()?;
//! store.insert_reading(&NewReading::new(21.5, 48.0))?;
//!
//! let page = store.query_readings(&ReadingQuery::new().limit(10))?;
//! # Ok::<(), dashboard_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{Bucket, NewReading, StoredReading};
pub use queries::{AggregateQuery, ReadingQuery};
pub use store::{DEFAULT_BUSY_TIMEOUT, Store, StoreOptions};

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/home-dashboard/sensor.db`
/// - macOS: `~/Library/Application Support/home-dashboard/sensor.db`
/// - Windows: `C:\Users\<user>\AppData\Local\home-dashboard\sensor.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("home-dashboard")
        .join("sensor.db")
}
