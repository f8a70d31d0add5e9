//! Server configuration.
//!
//! Read from a TOML file. Every section and field is optional; anything
//! missing takes its default:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [storage]
//! path = "/var/lib/home-dashboard/sensor.db"
//! busy_timeout_ms = 5000
//!
//! [dashboard]
//! timezone = "Europe/Rome"
//! page_size = 10
//! default_period_secs = 604800
//! default_interval_secs = 3600
//! lock_timeout_ms = 5000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use dashboard_core::{ChartRequest, DashboardOptions, LabelFormatter};
use dashboard_store::StoreOptions;
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Dashboard defaults.
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Load configuration from the default path, or defaults if it is absent.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Check every section and report all problems at once.
    ///
    /// # Example
    ///
    /// ```
    /// use dashboard_service::Config;
    ///
    /// let config = Config::default();
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = self.server.validate();
        errors.extend(self.storage.validate());
        errors.extend(self.dashboard.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        if self.bind.is_empty() {
            return vec![ValidationError::new(
                "server.bind",
                "bind address cannot be empty",
            )];
        }

        let Some((_, port)) = self.bind.rsplit_once(':') else {
            return vec![ValidationError::new(
                "server.bind",
                format!(
                    "invalid bind address '{}': expected format 'host:port'",
                    self.bind
                ),
            )];
        };

        match port.parse::<u16>() {
            Ok(0) => vec![ValidationError::new("server.bind", "port cannot be 0")],
            Ok(_) => Vec::new(),
            Err(_) => vec![ValidationError::new(
                "server.bind",
                format!("invalid port '{}': must be a number 1-65535", port),
            )],
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path.
    pub path: PathBuf,
    /// How long a write waits for another writer's lock, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: dashboard_store::default_db_path(),
            busy_timeout_ms: dashboard_store::DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.path",
                "database path cannot be empty",
            ));
        }
        if self.busy_timeout_ms == 0 {
            errors.push(ValidationError::new(
                "storage.busy_timeout_ms",
                "busy timeout must be at least 1 ms",
            ));
        }

        errors
    }

    /// Options for opening the store.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

/// Dashboard defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// IANA timezone for labels.
    pub timezone: String,
    /// Rows per page when the request gives no `limit`.
    pub page_size: u64,
    /// Chart window when the request gives no `period`, in seconds.
    pub default_period_secs: u64,
    /// Chart bucket width when the request gives no `interval`, in seconds.
    pub default_interval_secs: u64,
    /// How long a request waits for the store, in milliseconds.
    pub lock_timeout_ms: u64,
}

/// Longest accepted default period: ten years.
pub const MAX_DEFAULT_PERIOD_SECS: u64 = 10 * 365 * 24 * 3600;

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            timezone: dashboard_core::labels::DEFAULT_TIMEZONE.to_string(),
            page_size: dashboard_core::pagination::DEFAULT_PAGE_SIZE,
            default_period_secs: 7 * 24 * 3600,
            default_interval_secs: 3600,
            lock_timeout_ms: dashboard_core::DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
        }
    }
}

impl DashboardConfig {
    /// Validate dashboard configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if LabelFormatter::from_name(&self.timezone).is_err() {
            errors.push(ValidationError::new(
                "dashboard.timezone",
                format!("unknown timezone '{}'", self.timezone),
            ));
        }
        if self.page_size == 0 {
            errors.push(ValidationError::new(
                "dashboard.page_size",
                "page size must be at least 1",
            ));
        }
        if self.default_period_secs > MAX_DEFAULT_PERIOD_SECS {
            errors.push(ValidationError::new(
                "dashboard.default_period_secs",
                format!(
                    "period {} is too long (maximum {} seconds)",
                    self.default_period_secs, MAX_DEFAULT_PERIOD_SECS
                ),
            ));
        }
        if self.default_interval_secs == 0 {
            errors.push(ValidationError::new(
                "dashboard.default_interval_secs",
                "interval must be at least 1 second",
            ));
        } else if self.default_interval_secs > MAX_DEFAULT_PERIOD_SECS {
            errors.push(ValidationError::new(
                "dashboard.default_interval_secs",
                format!(
                    "interval {} is too long (maximum {} seconds)",
                    self.default_interval_secs, MAX_DEFAULT_PERIOD_SECS
                ),
            ));
        }
        if self.lock_timeout_ms == 0 {
            errors.push(ValidationError::new(
                "dashboard.lock_timeout_ms",
                "lock timeout must be at least 1 ms",
            ));
        }

        errors
    }

    /// Options for the dashboard. Fails on an unknown timezone.
    pub fn options(&self) -> dashboard_core::Result<DashboardOptions> {
        Ok(DashboardOptions {
            labels: LabelFormatter::from_name(&self.timezone)?,
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
        })
    }

    /// Chart used when a request names no period or interval.
    pub fn default_chart(&self) -> ChartRequest {
        ChartRequest::new(
            seconds(self.default_period_secs),
            seconds(self.default_interval_secs),
        )
    }
}

fn seconds(secs: u64) -> time::Duration {
    time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `dashboard.timezone`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("home-dashboard")
        .join("server.toml")
}
