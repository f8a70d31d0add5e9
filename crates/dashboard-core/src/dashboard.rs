//! The dashboard facade.
//!
//! [`Dashboard`] owns the [`Store`] and serializes access to it. Every
//! operation acquires the store with a bounded wait; a caller that cannot get
//! it within [`DashboardOptions::lock_timeout`] receives
//! [`Error::LockTimeout`] instead of queueing forever.

use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use dashboard_store::{NewReading, Store};

use crate::chart::{ChartRequest, ChartSeries};
use crate::error::{Error, Result};
use crate::freshness::{self, Freshness, FreshnessToken};
use crate::labels::LabelFormatter;
use crate::pagination::{Page, PageCursor};

/// Default bound on waiting for the store.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for a [`Dashboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Timezone used for chart and row labels.
    pub labels: LabelFormatter,
    /// How long an operation waits for the store before giving up.
    pub lock_timeout: Duration,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            labels: LabelFormatter::default(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

/// Pages, charts and freshness checks over one reading store.
pub struct Dashboard {
    store: Mutex<Store>,
    labels: LabelFormatter,
    lock_timeout: Duration,
}

impl Dashboard {
    /// Wrap a store.
    pub fn new(store: Store, options: DashboardOptions) -> Self {
        info!(
            "Dashboard ready (timezone {}, lock timeout {:?})",
            options.labels.timezone().name(),
            options.lock_timeout
        );
        Self {
            store: Mutex::new(store),
            labels: options.labels,
            lock_timeout: options.lock_timeout,
        }
    }

    /// Label formatter in use.
    pub fn labels(&self) -> &LabelFormatter {
        &self.labels
    }

    /// Configured lock wait bound.
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    async fn lock(&self) -> Result<MutexGuard<'_, Store>> {
        tokio::time::timeout(self.lock_timeout, self.store.lock())
            .await
            .map_err(|_| {
                warn!("Store lock not acquired within {:?}", self.lock_timeout);
                Error::LockTimeout(self.lock_timeout)
            })
    }

    /// One page of readings, newest first.
    ///
    /// A cursor with `limit == 0` returns no rows without querying them.
    pub async fn fetch_page(&self, cursor: PageCursor) -> Result<Page> {
        let store = self.lock().await?;
        let last_updated = store.last_updated()?.map(FreshnessToken::new);

        let rows = if cursor.limit == 0 {
            Vec::new()
        } else {
            store.list_readings(cursor.limit, cursor.offset)?
        };
        debug!(
            "Fetched {} readings (limit {}, offset {})",
            rows.len(),
            cursor.limit,
            cursor.offset
        );

        Ok(Page {
            rows,
            cursor,
            last_updated,
        })
    }

    /// Chart for the window ending now.
    pub async fn fetch_chart(&self, request: ChartRequest) -> Result<ChartSeries> {
        self.fetch_chart_at(OffsetDateTime::now_utc(), request).await
    }

    /// Chart for the window ending at `now`.
    ///
    /// Invalid requests are rejected before the store is touched.
    pub async fn fetch_chart_at(
        &self,
        now: OffsetDateTime,
        request: ChartRequest,
    ) -> Result<ChartSeries> {
        let query = request.query_at(now)?;

        let buckets = {
            let store = self.lock().await?;
            store.aggregate(&query)?
        };
        debug!("Chart from {} to {}: {} buckets", query.from, query.to, buckets.len());

        Ok(ChartSeries::from_buckets(&buckets, &self.labels))
    }

    /// Compare a client token with the store's last write.
    pub async fn check_freshness(&self, client_token: Option<&str>) -> Result<Freshness> {
        let last_updated = self.last_updated().await?;
        Ok(freshness::check(client_token, last_updated))
    }

    /// Store a reading stamped with the current time.
    pub async fn record_reading(&self, temperature: f64, humidity: f64) -> Result<i64> {
        self.insert(NewReading::new(temperature, humidity)).await
    }

    /// Store a reading stamped with `recorded_at`.
    pub async fn record_reading_at(
        &self,
        recorded_at: OffsetDateTime,
        temperature: f64,
        humidity: f64,
    ) -> Result<i64> {
        self.insert(NewReading::new(temperature, humidity).at(recorded_at))
            .await
    }

    async fn insert(&self, reading: NewReading) -> Result<i64> {
        if !reading.temperature.is_finite() || !reading.humidity.is_finite() {
            return Err(Error::InvalidArgument(
                "temperature and humidity must be finite numbers".into(),
            ));
        }

        let store = self.lock().await?;
        let id = store.insert_reading(&reading)?;
        info!(
            "Recorded reading {}: {} °C, {} %",
            id, reading.temperature, reading.humidity
        );
        Ok(id)
    }

    /// Instant of the most recent reading, `None` when empty.
    pub async fn last_updated(&self) -> Result<Option<OffsetDateTime>> {
        let store = self.lock().await?;
        Ok(store.last_updated()?)
    }

    /// Number of stored readings.
    pub async fn count_readings(&self) -> Result<u64> {
        let store = self.lock().await?;
        Ok(store.count_readings()?)
    }
}
