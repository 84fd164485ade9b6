//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory name under the platform config/data dirs
pub const APP_DIR: &str = "ai-roundtable";

/// Records kept in history when the configuration does not say
pub const DEFAULT_MAX_RECORDS: usize = 50;

/// Raw storage configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Meeting history file (defaults under the platform data dir)
    pub history_path: Option<PathBuf>,
    /// Credential file (defaults under the platform config dir)
    pub credentials_path: Option<PathBuf>,
    /// Oldest records are evicted past this count
    pub max_records: usize,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            history_path: None,
            credentials_path: None,
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

impl FileStorageConfig {
    /// Resolved history file path
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_path
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR).join("history.json")))
    }

    /// Resolved credential file path
    pub fn credentials_path(&self) -> Option<PathBuf> {
        self.credentials_path
            .clone()
            .or_else(|| dirs::config_dir().map(|d| d.join(APP_DIR).join("credentials.toml")))
    }
}
