//! API keys entered through `set-key`, kept in a TOML file.
//!
//! ```toml
//! claude = "sk-ant-..."
//! gemini = "AIza..."
//! ```

use roundtable_application::{CredentialStore, StorageError};
use roundtable_domain::BackendId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// [`CredentialStore`] backed by a TOML table of backend id → key
pub struct TomlCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TomlCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text).map_err(|e| StorageError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn write(&self, keys: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string(keys).map_err(|e| StorageError::Serialize(e.to_string()))?;
        std::fs::write(&self.path, text)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl CredentialStore for TomlCredentialStore {
    fn get(&self, backend: BackendId) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .read()?
            .remove(backend.as_str())
            .filter(|key| !key.trim().is_empty()))
    }

    fn set(&self, backend: BackendId, api_key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys = self.read()?;
        if api_key.trim().is_empty() {
            keys.remove(backend.as_str());
        } else {
            keys.insert(backend.as_str().to_string(), api_key.trim().to_string());
        }
        self.write(&keys)?;
        debug!(backend = %backend, path = %self.path.display(), "Credential stored");
        Ok(())
    }
}
