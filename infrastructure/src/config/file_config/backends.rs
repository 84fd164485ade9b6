//! Backend configuration from TOML (`[backends.<id>]` sections)

use crate::backends::BackendSettings;
use roundtable_domain::BackendId;
use serde::{Deserialize, Serialize};

/// Per-backend settings. Every field is optional; unset fields fall back
/// to the backend's built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    pub model: Option<String>,
    /// Direct API key (prefer the environment variable)
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Versioned base URL, for proxies and compatible gateways
    pub base_url: Option<String>,
    /// Cap on tokens per reply
    pub max_tokens: Option<u32>,
}

/// Raw `[backends]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendsConfig {
    pub claude: FileBackendConfig,
    pub chatgpt: FileBackendConfig,
    pub gemini: FileBackendConfig,
    pub copilot: FileBackendConfig,
}

impl FileBackendsConfig {
    pub fn get(&self, id: BackendId) -> &FileBackendConfig {
        match id {
            BackendId::Claude => &self.claude,
            BackendId::ChatGpt => &self.chatgpt,
            BackendId::Gemini => &self.gemini,
            BackendId::Copilot => &self.copilot,
        }
    }

    /// Configured model, or the backend's default
    pub fn model(&self, id: BackendId) -> String {
        self.get(id)
            .model
            .clone()
            .unwrap_or_else(|| id.default_model().to_string())
    }

    /// Environment variable consulted for the API key
    pub fn api_key_env(&self, id: BackendId) -> String {
        self.get(id)
            .api_key_env
            .clone()
            .unwrap_or_else(|| id.api_key_env().to_string())
    }

    /// Resolve the API key from the file or the environment.
    ///
    /// An explicit `api_key` wins over the environment variable. Blank
    /// values count as absent. The credential store is consulted by the
    /// caller when this returns `None`.
    pub fn configured_api_key(
        &self,
        id: BackendId,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        let explicit = self.get(id).api_key.clone();
        explicit
            .or_else(|| env(&self.api_key_env(id)))
            .filter(|key| !key.trim().is_empty())
    }

    /// Adapter settings for `id` bound to `api_key`
    pub fn settings(&self, id: BackendId, api_key: String) -> BackendSettings {
        let file = self.get(id);
        let mut settings = BackendSettings::new(api_key, self.model(id));
        if let Some(base_url) = &file.base_url {
            settings = settings.with_base_url(base_url.as_str());
        }
        if let Some(max_tokens) = file.max_tokens {
            settings = settings.with_max_tokens(max_tokens);
        }
        settings
    }
}
