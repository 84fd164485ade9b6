//! Meeting participants

use crate::backend::BackendId;
use serde::{Deserialize, Serialize};

/// One discussion voice: a backend plus the model it runs (Entity)
///
/// Immutable once a meeting starts; the meeting owns its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    id: String,
    name: String,
    backend: BackendId,
    model: String,
    color: String,
    icon: String,
}

impl Participant {
    /// Create a participant using the backend's static presentation metadata
    pub fn new(id: impl Into<String>, backend: BackendId, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: backend.display_name().to_string(),
            backend,
            model: model.into(),
            color: backend.color().to_string(),
            icon: backend.icon().to_string(),
        }
    }

    /// A participant keyed by its backend id, running the backend's default model
    pub fn for_backend(backend: BackendId) -> Self {
        Self::new(backend.as_str(), backend, backend.default_model())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> BackendId {
        self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn summary(&self) -> ParticipantSummary {
        ParticipantSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// The (id, name) pair stored in a finalized meeting record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: String,
    pub name: String,
}
