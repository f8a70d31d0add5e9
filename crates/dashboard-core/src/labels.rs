//! Human-readable timestamps in the dashboard's timezone.

use chrono::DateTime;
use chrono_tz::Tz;
use time::OffsetDateTime;

use crate::error::{Error, Result};

/// Timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Europe/Rome";

/// Format of chart axis labels, e.g. `01/02 15:04`.
pub const CHART_LABEL_FORMAT: &str = "%d/%m %H:%M";

/// Format of timestamps shown next to raw rows, e.g. `Monday Jan 2 15:04:05`.
pub const ROW_LABEL_FORMAT: &str = "%A %b %-d %H:%M:%S";

/// Formats instants in a fixed IANA timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelFormatter {
    tz: Tz,
}

impl LabelFormatter {
    /// Create a formatter for a timezone.
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Resolve an IANA zone name such as `Europe/Rome`.
    pub fn from_name(name: &str) -> Result<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|_| Error::InvalidArgument(format!("unknown timezone '{}'", name)))
    }

    /// The configured timezone.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Label for a chart bucket.
    pub fn chart_label(&self, ts: OffsetDateTime) -> String {
        self.format(ts, CHART_LABEL_FORMAT)
    }

    /// Label for a raw reading row.
    pub fn row_label(&self, ts: OffsetDateTime) -> String {
        self.format(ts, ROW_LABEL_FORMAT)
    }

    fn format(&self, ts: OffsetDateTime, fmt: &str) -> String {
        match DateTime::from_timestamp(ts.unix_timestamp(), ts.nanosecond()) {
            Some(utc) => utc.with_timezone(&self.tz).format(fmt).to_string(),
            None => ts.to_string(),
        }
    }
}

impl Default for LabelFormatter {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Rome)
    }
}
