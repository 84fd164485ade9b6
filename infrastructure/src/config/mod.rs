//! Configuration file loading for ai-roundtable
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `ROUNDTABLE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./roundtable.toml` or `./.roundtable.toml`
//! 4. Global: `<config dir>/ai-roundtable/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    APP_DIR, ConfigValidationError, DEFAULT_MAX_RECORDS, FileBackendConfig, FileBackendsConfig,
    FileConfig, FileMeetingConfig, FileOutputConfig, FileOutputFormat, FileStorageConfig,
};
pub use loader::ConfigLoader;
