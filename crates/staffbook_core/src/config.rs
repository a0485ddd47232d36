//! Store and logging configuration.
//!
//! # Responsibility
//! - Name the backend keys each collection is stored under.
//! - Carry app identity used for default settings and export metadata.
//!
//! # Invariants
//! - Every key in `StorageKeys` is distinct.

use crate::logging::default_log_level;
use std::path::PathBuf;

/// Default display format for `Person::register_date` (chrono strftime).
pub const DEFAULT_REGISTER_DATE_FORMAT: &str = "%Y/%m/%d";
const DEFAULT_APP_NAME: &str = "Staffbook";

/// Backend keys for the three persisted collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub persons: String,
    pub evaluations: String,
    pub settings: String,
}

impl StorageKeys {
    /// Key layout of older deployments, which stored settings under `settings`.
    pub fn legacy() -> Self {
        Self {
            settings: "settings".to_string(),
            ..Self::default()
        }
    }

    /// Returns keys in persist order.
    pub fn all(&self) -> [&str; 3] {
        [
            self.persons.as_str(),
            self.evaluations.as_str(),
            self.settings.as_str(),
        ]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            persons: "persons".to_string(),
            evaluations: "evaluations".to_string(),
            settings: "app_settings".to_string(),
        }
    }
}

/// Runtime options for `RecordStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub keys: StorageKeys,
    /// Written into default settings and export metadata.
    pub app_name: String,
    pub app_version: String,
    /// chrono strftime pattern used for `registerDate`.
    pub register_date_format: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            app_name: DEFAULT_APP_NAME.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            register_date_format: DEFAULT_REGISTER_DATE_FORMAT.to_string(),
        }
    }
}

/// Logging bootstrap options consumed by `init_logging`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// One of `trace|debug|info|warn|error`, case-insensitive.
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

impl LogConfig {
    /// Uses the build-mode default level.
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: log_dir.into(),
        }
    }
}
