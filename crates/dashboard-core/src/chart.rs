//! Time-bucketed chart series.
//!
//! A [`ChartRequest`] covers the window `[now - period, now]` split into
//! buckets of `interval`. Buckets are aligned to the Unix epoch, not to the
//! start of the window, so the first bucket may begin before `now - period`
//! and consecutive requests agree on where buckets fall.

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use dashboard_store::{AggregateQuery, Bucket};

use crate::error::{Error, Result};
use crate::labels::LabelFormatter;

/// Default chart window: seven days.
pub const DEFAULT_PERIOD: Duration = Duration::days(7);

/// Default bucket width: one hour.
pub const DEFAULT_INTERVAL: Duration = Duration::hours(1);

/// Parameters of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRequest {
    /// How far back from "now" the chart reaches.
    pub period: Duration,
    /// Bucket width.
    pub interval: Duration,
}

impl ChartRequest {
    /// Create a request.
    pub fn new(period: Duration, interval: Duration) -> Self {
        Self { period, interval }
    }

    /// Reject requests outside the domain.
    ///
    /// The interval must be positive and fit in i64 nanoseconds; the period
    /// must not be negative.
    pub fn validate(&self) -> Result<()> {
        if !self.interval.is_positive() {
            return Err(Error::InvalidArgument(format!(
                "interval must be positive, got {}",
                self.interval
            )));
        }
        if i64::try_from(self.interval.whole_nanoseconds()).is_err() {
            return Err(Error::InvalidArgument(format!(
                "interval {} is too large",
                self.interval
            )));
        }
        if self.period.is_negative() {
            return Err(Error::InvalidArgument(format!(
                "period must not be negative, got {}",
                self.period
            )));
        }
        Ok(())
    }

    /// The aggregate query for a chart ending at `now`.
    pub fn query_at(&self, now: OffsetDateTime) -> Result<AggregateQuery> {
        self.validate()?;
        let from = now.checked_sub(self.period).ok_or_else(|| {
            Error::InvalidArgument(format!("period {} reaches out of range", self.period))
        })?;
        Ok(AggregateQuery::new(from, now, self.interval)?)
    }
}

impl Default for ChartRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD, DEFAULT_INTERVAL)
    }
}

/// Labels and parallel value series, one entry per non-empty bucket.
///
/// All three vectors always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
}

impl ChartSeries {
    /// Build series from buckets, oldest first.
    pub fn from_buckets(buckets: &[Bucket], labels: &LabelFormatter) -> Self {
        let mut series = Self {
            labels: Vec::with_capacity(buckets.len()),
            temperature: Vec::with_capacity(buckets.len()),
            humidity: Vec::with_capacity(buckets.len()),
        };
        for bucket in buckets {
            series.labels.push(labels.chart_label(bucket.start));
            series.temperature.push(bucket.avg_temperature);
            series.humidity.push(bucket.avg_humidity);
        }
        series
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the chart has no points.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
