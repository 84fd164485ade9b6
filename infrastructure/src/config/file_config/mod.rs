//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod backends;
mod meeting;
mod output;
mod storage;

pub use backends::{FileBackendConfig, FileBackendsConfig};
pub use meeting::FileMeetingConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use storage::{APP_DIR, DEFAULT_MAX_RECORDS, FileStorageConfig};

use roundtable_application::BehaviorConfig;
use roundtable_domain::BackendId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("meeting.rounds must be at least 1")]
    InvalidRounds,

    #[error("meeting.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("max_tokens must be at least 1 ({0})")]
    InvalidMaxTokens(String),

    #[error("storage.max_records must be at least 1")]
    InvalidMaxRecords,

    #[error("backends.{0}.model cannot be empty")]
    EmptyModelName(BackendId),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Meeting defaults
    pub meeting: FileMeetingConfig,
    /// Per-backend settings
    pub backends: FileBackendsConfig,
    /// History and credential files
    pub storage: FileStorageConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the configuration, reporting the first problem found
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.meeting.rounds == 0 {
            return Err(ConfigValidationError::InvalidRounds);
        }
        if let Some(0) = self.meeting.timeout_seconds {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.meeting.max_tokens == 0 {
            return Err(ConfigValidationError::InvalidMaxTokens(
                "meeting".to_string(),
            ));
        }
        if self.storage.max_records == 0 {
            return Err(ConfigValidationError::InvalidMaxRecords);
        }
        for id in BackendId::ALL {
            let backend = self.backends.get(id);
            if let Some(model) = &backend.model
                && model.trim().is_empty()
            {
                return Err(ConfigValidationError::EmptyModelName(id));
            }
            if backend.max_tokens == Some(0) {
                return Err(ConfigValidationError::InvalidMaxTokens(format!(
                    "backends.{id}"
                )));
            }
        }
        Ok(())
    }

    /// Orchestrator behavior derived from `[meeting]`
    pub fn behavior(&self) -> BehaviorConfig {
        BehaviorConfig::from_timeout_seconds(self.meeting.timeout_seconds)
            .with_max_tokens(self.meeting.max_tokens)
    }
}
