//! Backend identifiers and their static metadata.
//!
//! A [`BackendId`] names one vendor integration. Everything a shell needs to
//! present a backend (display name, color, icon, default model and the
//! selectable model catalogue) is static and lives here; construction of
//! the actual adapter belongs to the infrastructure registry.

use crate::core::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A selectable model in a backend's catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOption {
    pub id: &'static str,
    pub name: &'static str,
    /// Publisher grouping, for catalogues that mix vendors
    pub group: Option<&'static str>,
}

const fn model(id: &'static str, name: &'static str) -> ModelOption {
    ModelOption {
        id,
        name,
        group: None,
    }
}

const fn grouped(id: &'static str, name: &'static str, group: &'static str) -> ModelOption {
    ModelOption {
        id,
        name,
        group: Some(group),
    }
}

const CLAUDE_MODELS: &[ModelOption] = &[
    model("claude-opus-4-6", "Claude Opus 4.6"),
    model("claude-sonnet-4-5-20250929", "Claude Sonnet 4.5"),
    model("claude-haiku-4-5-20251001", "Claude Haiku 4.5"),
];

const CHATGPT_MODELS: &[ModelOption] = &[
    model("gpt-4o", "GPT-4o"),
    model("gpt-4o-mini", "GPT-4o Mini"),
    model("gpt-4-turbo", "GPT-4 Turbo"),
];

const GEMINI_MODELS: &[ModelOption] = &[
    model("gemini-2.0-flash", "Gemini 2.0 Flash"),
    model("gemini-2.0-pro", "Gemini 2.0 Pro"),
    model("gemini-1.5-pro", "Gemini 1.5 Pro"),
];

const COPILOT_MODELS: &[ModelOption] = &[
    grouped("openai/gpt-4.1", "GPT-4.1", "OpenAI"),
    grouped("openai/gpt-4.1-mini", "GPT-4.1 Mini", "OpenAI"),
    grouped("openai/gpt-4.1-nano", "GPT-4.1 Nano", "OpenAI"),
    grouped("openai/gpt-4o", "GPT-4o", "OpenAI"),
    grouped("openai/gpt-4o-mini", "GPT-4o Mini", "OpenAI"),
    grouped("openai/gpt-5", "GPT-5", "OpenAI"),
    grouped("openai/gpt-5-mini", "GPT-5 Mini", "OpenAI"),
    grouped("openai/o3", "o3", "OpenAI"),
    grouped("openai/o3-mini", "o3-mini", "OpenAI"),
    grouped("openai/o4-mini", "o4-mini", "OpenAI"),
    grouped("deepseek/DeepSeek-R1", "DeepSeek R1", "DeepSeek"),
    grouped("deepseek/DeepSeek-R1-0528", "DeepSeek R1 0528", "DeepSeek"),
    grouped("deepseek/DeepSeek-V3-0324", "DeepSeek V3", "DeepSeek"),
    grouped("Meta-Llama-3.1-405B-Instruct", "Llama 3.1 405B", "Meta"),
    grouped("Llama-3.3-70B-Instruct", "Llama 3.3 70B", "Meta"),
    grouped("Llama-3.2-90B-Vision-Instruct", "Llama 3.2 90B Vision", "Meta"),
    grouped("xai/grok-3", "Grok 3", "xAI"),
    grouped("xai/grok-3-mini", "Grok 3 Mini", "xAI"),
    grouped("mistral/Mistral-Medium-3", "Mistral Medium 3", "Mistral"),
    grouped("mistral/Mistral-Small-3.1", "Mistral Small 3.1", "Mistral"),
    grouped("cohere/Command-A", "Command A", "Cohere"),
    grouped("cohere/Command-R-Plus-08-2024", "Command R+", "Cohere"),
];

/// Supported model backends (Value Object)
///
/// A closed set: every backend the registry can construct is listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BackendId {
    Claude,
    ChatGpt,
    Gemini,
    Copilot,
}

impl BackendId {
    /// All backends in their canonical order
    pub const ALL: [BackendId; 4] = [
        BackendId::Claude,
        BackendId::ChatGpt,
        BackendId::Gemini,
        BackendId::Copilot,
    ];

    /// Get the string identifier for this backend
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Claude => "claude",
            BackendId::ChatGpt => "chatgpt",
            BackendId::Gemini => "gemini",
            BackendId::Copilot => "copilot",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BackendId::Claude => "Claude",
            BackendId::ChatGpt => "ChatGPT",
            BackendId::Gemini => "Gemini",
            BackendId::Copilot => "Copilot",
        }
    }

    /// Presentation color as a hex string
    pub fn color(&self) -> &'static str {
        match self {
            BackendId::Claude => "#D97757",
            BackendId::ChatGpt => "#10A37F",
            BackendId::Gemini => "#4285F4",
            BackendId::Copilot => "#8B5CF6",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            BackendId::Claude => "🟠",
            BackendId::ChatGpt => "🟢",
            BackendId::Gemini => "🔵",
            BackendId::Copilot => "🟣",
        }
    }

    /// Model used when the configuration does not pick one
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendId::Claude => "claude-sonnet-4-5-20250929",
            BackendId::ChatGpt => "gpt-4o",
            BackendId::Gemini => "gemini-2.0-flash",
            BackendId::Copilot => "openai/gpt-4.1",
        }
    }

    /// Static catalogue of selectable models
    pub fn models(&self) -> &'static [ModelOption] {
        match self {
            BackendId::Claude => CLAUDE_MODELS,
            BackendId::ChatGpt => CHATGPT_MODELS,
            BackendId::Gemini => GEMINI_MODELS,
            BackendId::Copilot => COPILOT_MODELS,
        }
    }

    /// Look up a model's display name, falling back to the raw id
    pub fn model_name<'a>(&self, model_id: &'a str) -> &'a str {
        self.models()
            .iter()
            .find(|m| m.id == model_id)
            .map(|m| m.name)
            .unwrap_or(model_id)
    }

    /// Environment variable conventionally holding this backend's API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            BackendId::Claude => "ANTHROPIC_API_KEY",
            BackendId::ChatGpt => "OPENAI_API_KEY",
            BackendId::Gemini => "GEMINI_API_KEY",
            BackendId::Copilot => "GITHUB_TOKEN",
        }
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BackendId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(BackendId::Claude),
            "chatgpt" | "openai" => Ok(BackendId::ChatGpt),
            "gemini" => Ok(BackendId::Gemini),
            "copilot" | "github" => Ok(BackendId::Copilot),
            _ => Err(DomainError::UnknownBackend(s.to_string())),
        }
    }
}

impl Serialize for BackendId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BackendId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_roundtrip() {
        for id in BackendId::ALL {
            let parsed: BackendId = id.as_str().parse().unwrap();
            assert_eq!(parsed, id);
        }
    }

    #[test]
    fn test_unknown_backend() {
        let err = "mistral".parse::<BackendId>().unwrap_err();
        assert_eq!(err, DomainError::UnknownBackend("mistral".to_string()));
    }

    #[test]
    fn test_default_model_is_in_catalogue_or_known() {
        for id in [BackendId::ChatGpt, BackendId::Gemini, BackendId::Copilot, BackendId::Claude] {
            assert!(
                id.models().iter().any(|m| m.id == id.default_model()),
                "{id} default model missing from catalogue"
            );
        }
    }

    #[test]
    fn test_copilot_catalogue_is_grouped() {
        let models = BackendId::Copilot.models();
        assert_eq!(models.len(), 22);
        assert!(models.iter().all(|m| m.group.is_some()));
        assert!(BackendId::Claude.models().iter().all(|m| m.group.is_none()));
    }

    #[test]
    fn test_model_name_lookup() {
        assert_eq!(BackendId::ChatGpt.model_name("gpt-4o-mini"), "GPT-4o Mini");
        assert_eq!(BackendId::ChatGpt.model_name("gpt-9"), "gpt-9");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&BackendId::Gemini).unwrap();
        assert_eq!(json, "\"gemini\"");
        let id: BackendId = serde_json::from_str("\"copilot\"").unwrap();
        assert_eq!(id, BackendId::Copilot);
    }
}
