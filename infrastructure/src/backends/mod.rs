//! Vendor adapters implementing [`ModelBackend`](roundtable_application::ModelBackend).
//!
//! Each adapter owns a `reqwest` client and speaks one vendor's wire format.
//! [`BackendRegistry`] maps a [`BackendId`](roundtable_domain::BackendId) to
//! the constructor for its adapter.

pub mod claude;
pub mod gemini;
mod http;
pub mod openai;
pub mod registry;
mod sse;

pub use claude::ClaudeBackend;
pub use gemini::GeminiBackend;
pub use openai::OpenAiCompatibleBackend;
pub use registry::{BackendConstructor, BackendRegistry};

/// Everything needed to bind an adapter to one account and model
#[derive(Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub api_key: String,
    pub model: String,
    /// Overrides the vendor's versioned base URL
    pub base_url: Option<String>,
    /// Upper bound on tokens per reply, whatever the caller asks for
    pub max_tokens: Option<u32>,
}

impl BackendSettings {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            max_tokens: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Tokens to request: the caller's figure, capped by the configured limit
pub(crate) fn capped_tokens(limit: Option<u32>, requested: u32) -> u32 {
    limit.map_or(requested, |limit| limit.min(requested))
}

// Keys stay out of debug output
impl std::fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key() {
        let settings = BackendSettings::new("sk-secret", "gpt-4o");
        let debug = format!("{settings:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("gpt-4o"));
    }

    #[test]
    fn test_capped_tokens() {
        assert_eq!(capped_tokens(None, 4096), 4096);
        assert_eq!(capped_tokens(Some(1024), 4096), 1024);
        assert_eq!(capped_tokens(Some(1024), 10), 10);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let settings = BackendSettings::new("k", "m").with_base_url("http://proxy/v1/");
        assert_eq!(settings.base_url.as_deref(), Some("http://proxy/v1"));
    }
}
