//! HTTP API for the home climate dashboard.
//!
//! The service stores temperature/humidity readings posted by a sensor and
//! serves them to the dashboard page as raw rows and as a bucketed chart.
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check and reading count
//! - `GET /api/dashboard` - First page of readings plus the chart (conditional)
//! - `GET /api/readings` - One page of readings, "load more" style (conditional)
//! - `GET /api/chart` - Chart series for `period` and `interval`
//! - `POST /api/readings?temperature=..&humidity=..` - Store a reading
//!
//! `period` and `interval` take durations such as `168h`, `1h30m` or `90s`.
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/home-dashboard/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [storage]
//! path = "~/.local/share/home-dashboard/sensor.db"
//!
//! [dashboard]
//! timezone = "Europe/Rome"
//! ```

pub mod api;
pub mod config;
pub mod params;
pub mod state;

pub use config::{Config, ConfigError, DashboardConfig, ServerConfig, StorageConfig};
pub use state::AppState;
