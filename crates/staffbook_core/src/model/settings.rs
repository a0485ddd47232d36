//! App settings record.

use crate::config::StoreConfig;
use crate::model::lenient;
use serde::{Deserialize, Serialize};

/// Persisted app-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, deserialize_with = "lenient::string")]
    pub app_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub version: String,
    /// ISO timestamp of the most recent export, `null` before the first one.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_backup: Option<String>,
}

impl Settings {
    /// Settings used when storage holds none or was reset.
    pub fn defaults_for(config: &StoreConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            version: config.app_version.clone(),
            last_backup: None,
        }
    }
}
