//! JSONL file writer for meeting updates.
//!
//! Each [`MeetingUpdate`] is serialized as a single JSON line carrying its
//! `type` tag plus a `timestamp`, appended through a buffered writer.
//! Stream chunks are skipped unless asked for; the matching `TURN_END` and
//! `EVAL_END` lines already carry the full text.

use roundtable_application::{MeetingUpdate, MeetingUpdateSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// JSONL meeting logger that writes one JSON object per update.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlMeetingLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    include_chunks: bool,
}

impl JsonlMeetingLogger {
    /// Create a new logger writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(dir = %parent.display(), error = %e, "Could not create event log directory");
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not create event log file");
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            include_chunks: false,
        })
    }

    /// Also log every `STREAM_CHUNK`
    pub fn with_chunks(mut self, include: bool) -> Self {
        self.include_chunks = include;
        self
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn line(update: &MeetingUpdate) -> Option<String> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut value = serde_json::to_value(update).ok()?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(timestamp),
            );
        }
        serde_json::to_string(&value).ok()
    }
}

impl MeetingUpdateSink for JsonlMeetingLogger {
    fn on_update(&self, update: &MeetingUpdate) {
        if !self.include_chunks && matches!(update, MeetingUpdate::StreamChunk { .. }) {
            return;
        }
        let Some(line) = Self::line(update) else {
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{line}");
        // JSONL is append-only; flush each line so a crash loses nothing
        let _ = writer.flush();
    }
}

impl Drop for JsonlMeetingLogger {
    fn drop(&mut self) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}
