//! File-backed persistence: meeting history and stored credentials

mod credentials;
mod json_store;

pub use credentials::TomlCredentialStore;
pub use json_store::JsonFileMeetingStore;

use crate::config::FileBackendsConfig;
use roundtable_application::CredentialStore;
use roundtable_domain::BackendId;
use tracing::warn;

/// Find the API key for `id`: config file, then environment, then store.
///
/// A store that cannot be read is logged and treated as holding no key.
pub fn resolve_api_key(
    backends: &FileBackendsConfig,
    id: BackendId,
    env: impl Fn(&str) -> Option<String>,
    store: Option<&dyn CredentialStore>,
) -> Option<String> {
    if let Some(key) = backends.configured_api_key(id, env) {
        return Some(key);
    }
    match store?.get(id) {
        Ok(key) => key,
        Err(e) => {
            warn!(backend = %id, error = %e, "Could not read credential store");
            None
        }
    }
}
