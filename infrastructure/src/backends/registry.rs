//! Backend registry
//!
//! Resolves a backend identifier to the constructor of its adapter. The
//! static metadata (names, colors, catalogues) lives on
//! [`BackendId`] itself; the registry only knows how to build adapters.

use super::{BackendSettings, ClaudeBackend, GeminiBackend, OpenAiCompatibleBackend};
use roundtable_application::{BackendError, ModelBackend};
use roundtable_domain::BackendId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Builds one adapter from its settings
pub type BackendConstructor = fn(BackendSettings) -> Result<Arc<dyn ModelBackend>, BackendError>;

fn claude(settings: BackendSettings) -> Result<Arc<dyn ModelBackend>, BackendError> {
    Ok(Arc::new(ClaudeBackend::new(settings)?))
}

fn chatgpt(settings: BackendSettings) -> Result<Arc<dyn ModelBackend>, BackendError> {
    Ok(Arc::new(OpenAiCompatibleBackend::chatgpt(settings)?))
}

fn gemini(settings: BackendSettings) -> Result<Arc<dyn ModelBackend>, BackendError> {
    Ok(Arc::new(GeminiBackend::new(settings)?))
}

fn copilot(settings: BackendSettings) -> Result<Arc<dyn ModelBackend>, BackendError> {
    Ok(Arc::new(OpenAiCompatibleBackend::copilot(settings)?))
}

/// Identifier → adapter constructor table
pub struct BackendRegistry {
    constructors: HashMap<BackendId, BackendConstructor>,
}

impl BackendRegistry {
    /// Registry with no constructors; tests register their own
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Override or add a constructor
    pub fn register(mut self, id: BackendId, constructor: BackendConstructor) -> Self {
        self.constructors.insert(id, constructor);
        self
    }

    pub fn contains(&self, id: BackendId) -> bool {
        self.constructors.contains_key(&id)
    }

    /// Registered identifiers in canonical order
    pub fn ids(&self) -> Vec<BackendId> {
        BackendId::ALL
            .into_iter()
            .filter(|id| self.contains(*id))
            .collect()
    }

    /// Build the adapter for `id`.
    ///
    /// An empty API key is rejected here so a missing credential surfaces
    /// before any request is attempted.
    pub fn create(
        &self,
        id: BackendId,
        settings: BackendSettings,
    ) -> Result<Arc<dyn ModelBackend>, BackendError> {
        if settings.api_key.trim().is_empty() {
            return Err(BackendError::MissingCredential(id));
        }
        let constructor = self
            .constructors
            .get(&id)
            .ok_or_else(|| BackendError::Other(format!("No adapter registered for {id}")))?;
        debug!(backend = %id, model = %settings.model, "Creating backend");
        constructor(settings)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::empty()
            .register(BackendId::Claude, claude)
            .register(BackendId::ChatGpt, chatgpt)
            .register(BackendId::Gemini, gemini)
            .register(BackendId::Copilot, copilot)
    }
}
