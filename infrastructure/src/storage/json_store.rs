//! Meeting history kept in a single JSON file.
//!
//! The file holds an array of records, newest first. Saving prepends and
//! evicts from the tail once `max_records` is exceeded. Writes go to a
//! sibling temp file that is then renamed over the original.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roundtable_application::{MeetingRepository, StorageError};
use roundtable_domain::MeetingRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// One history entry: the record plus when it was stored
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMeeting {
    #[serde(flatten)]
    record: MeetingRecord,
    saved_at: DateTime<Utc>,
}

/// [`MeetingRepository`] backed by a JSON array file
pub struct JsonFileMeetingStore {
    path: PathBuf,
    max_records: usize,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileMeetingStore {
    pub fn new(path: impl Into<PathBuf>, max_records: usize) -> Self {
        Self {
            path: path.into(),
            max_records: max_records.max(1),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<StoredMeeting>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn write_all(&self, entries: &[StoredMeeting]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::Serialize(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl MeetingRepository for JsonFileMeetingStore {
    async fn save(&self, record: &MeetingRecord) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        // Re-saving the same meeting replaces it
        entries.retain(|e| e.record.id != record.id);
        entries.insert(
            0,
            StoredMeeting {
                record: record.clone(),
                saved_at: Utc::now(),
            },
        );
        if entries.len() > self.max_records {
            warn!(
                evicted = entries.len() - self.max_records,
                "History full, dropping oldest meetings"
            );
            entries.truncate(self.max_records);
        }
        self.write_all(&entries).await?;
        debug!(id = %record.id, path = %self.path.display(), "Meeting saved");
        Ok(())
    }

    async fn list_recent(&self) -> Result<Vec<MeetingRecord>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .map(|e| e.record)
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<MeetingRecord>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .find(|e| e.record.id == id)
            .map(|e| e.record))
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        let before = entries.len();
        entries.retain(|e| e.record.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write_all(&entries).await?;
        Ok(true)
    }
}
