//! Dashboard logic over the reading store.
//!
//! This crate turns raw readings into what the dashboard shows:
//!
//! - [`chart`]: epoch-aligned, averaged chart series over a sliding window
//! - [`pagination`]: "load more" paging of raw readings, newest first
//! - [`freshness`]: conditional re-fetch based on the last write
//! - [`labels`]: timestamp labels in a configured timezone
//!
//! [`Dashboard`] ties these to a [`dashboard_store::Store`] behind an async
//! mutex with a bounded wait.
//!
//! # Example
//!
//! ```no_run
//! use dashboard_core::{ChartRequest, Dashboard, DashboardOptions, PageCursor};
//! use dashboard_store::Store;
//!
//! # async fn example() -> dashboard_core::Result<()> {
//! let dashboard = Dashboard::new(Store::open_default()?, DashboardOptions::default());
//! dashboard.record_reading(21.5, 48.0).await?;
//!
//! let page = dashboard.fetch_page(PageCursor::default()).await?;
//! let chart = dashboard.fetch_chart(ChartRequest::default()).await?;
//! println!("{} rows, {} chart points", page.rows.len(), chart.len());
//! # Ok(())
//! # }
//! ```

pub mod chart;
mod dashboard;
pub mod error;
pub mod freshness;
pub mod labels;
pub mod pagination;

pub use chart::{ChartRequest, ChartSeries};
pub use dashboard::{DEFAULT_LOCK_TIMEOUT, Dashboard, DashboardOptions};
pub use error::{Error, ErrorKind, Result};
pub use freshness::{Freshness, FreshnessToken};
pub use labels::LabelFormatter;
pub use pagination::{Page, PageCursor};
