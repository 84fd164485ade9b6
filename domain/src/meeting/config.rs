//! Meeting configuration value objects

use crate::core::error::DomainError;
use crate::core::topic::Topic;
use serde::{Deserialize, Serialize};

/// Default number of discussion rounds
pub const DEFAULT_ROUNDS: u32 = 2;

/// Default response language tag
pub const DEFAULT_LANGUAGE: &str = "zh-TW";

/// Whether participants critique each other after the discussion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    /// Every participant evaluates the others
    #[default]
    Cross,
    /// Skip the evaluation phase
    None,
}

impl EvaluationMode {
    pub fn is_enabled(&self) -> bool {
        matches!(self, EvaluationMode::Cross)
    }
}

impl std::str::FromStr for EvaluationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cross" => Ok(EvaluationMode::Cross),
            "none" | "off" => Ok(EvaluationMode::None),
            other => Err(format!("unknown evaluation mode: {other}")),
        }
    }
}

/// How speakers are ordered within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnOrder {
    /// Registration order, every round
    #[default]
    Sequential,
    /// A fresh shuffle every round
    Random,
}

impl std::str::FromStr for TurnOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(TurnOrder::Sequential),
            "random" => Ok(TurnOrder::Random),
            other => Err(format!("unknown turn order: {other}")),
        }
    }
}

/// Response language tag (BCP 47 style, e.g. `zh-TW`, `en`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn tag(&self) -> &str {
        &self.0
    }

    /// Name of the language models are asked to answer in.
    ///
    /// Only Traditional Chinese is recognised; every other tag asks for English.
    pub fn instruction_name(&self) -> &'static str {
        if self.0.eq_ignore_ascii_case("zh-TW") {
            "Traditional Chinese (繁體中文)"
        } else {
            "English"
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for a single meeting (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingConfig {
    pub topic: Topic,
    pub rounds: u32,
    pub evaluation_mode: EvaluationMode,
    pub turn_order: TurnOrder,
    pub language: Language,
}

impl MeetingConfig {
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            rounds: DEFAULT_ROUNDS,
            evaluation_mode: EvaluationMode::default(),
            turn_order: TurnOrder::default(),
            language: Language::default(),
        }
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_evaluation_mode(mut self, mode: EvaluationMode) -> Self {
        self.evaluation_mode = mode;
        self
    }

    pub fn with_turn_order(mut self, order: TurnOrder) -> Self {
        self.turn_order = order;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.rounds == 0 {
            return Err(DomainError::InvalidRounds);
        }
        Ok(())
    }
}
