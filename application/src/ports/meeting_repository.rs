//! Persistence ports
//!
//! - [`MeetingRepository`]: finished meeting records
//! - [`CredentialStore`]: per-backend API keys entered by the user

use async_trait::async_trait;
use roundtable_domain::{BackendId, MeetingRecord};
use thiserror::Error;

/// Errors raised by storage adapters
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt data in {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Store of finished meetings, newest first
#[async_trait]
pub trait MeetingRepository: Send + Sync {
    /// Persist a record; the store may evict its oldest entries
    async fn save(&self, record: &MeetingRecord) -> Result<(), StorageError>;

    /// Records ordered newest first
    async fn list_recent(&self) -> Result<Vec<MeetingRecord>, StorageError>;

    async fn get(&self, id: &str) -> Result<Option<MeetingRecord>, StorageError>;

    /// Returns whether a record was removed
    async fn delete(&self, id: &str) -> Result<bool, StorageError>;
}

/// Secondary source of API keys, consulted after config and environment
pub trait CredentialStore: Send + Sync {
    fn get(&self, backend: BackendId) -> Result<Option<String>, StorageError>;

    fn set(&self, backend: BackendId, api_key: &str) -> Result<(), StorageError>;
}
