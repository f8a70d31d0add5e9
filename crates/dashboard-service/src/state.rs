//! Application state shared across handlers.

use std::sync::Arc;

use dashboard_core::{Dashboard, Result};
use dashboard_store::Store;

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// Dashboard over the reading store.
    pub dashboard: Dashboard,
    /// Configuration the service was started with.
    pub config: Config,
}

impl AppState {
    /// Create application state.
    ///
    /// Fails if the configured timezone is unknown.
    pub fn new(store: Store, config: Config) -> Result<Arc<Self>> {
        let options = config.dashboard.options()?;
        Ok(Arc::new(Self {
            dashboard: Dashboard::new(store, options),
            config,
        }))
    }
}
