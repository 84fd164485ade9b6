//! Infrastructure layer for ai-roundtable
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: vendor HTTP backends, configuration file
//! loading, meeting history and credential files, and JSONL event logging.

pub mod backends;
pub mod config;
pub mod logging;
pub mod storage;

// Re-export commonly used types
pub use backends::{
    BackendRegistry, BackendSettings, ClaudeBackend, GeminiBackend, OpenAiCompatibleBackend,
};
pub use config::{
    ConfigLoader, ConfigValidationError, FileBackendConfig, FileBackendsConfig, FileConfig,
    FileMeetingConfig, FileOutputConfig, FileOutputFormat, FileStorageConfig,
};
pub use logging::JsonlMeetingLogger;
pub use storage::{JsonFileMeetingStore, TomlCredentialStore, resolve_api_key};
