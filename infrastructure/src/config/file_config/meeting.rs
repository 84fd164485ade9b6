//! Meeting defaults from TOML (`[meeting]` section)

use roundtable_domain::{
    BackendId, DEFAULT_LANGUAGE, DEFAULT_ROUNDS, EvaluationMode, Language, MeetingConfig, Topic,
    TurnOrder,
};
use serde::{Deserialize, Serialize};

/// Raw meeting defaults from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMeetingConfig {
    /// Number of discussion rounds
    pub rounds: u32,
    pub evaluation_mode: EvaluationMode,
    pub turn_order: TurnOrder,
    /// Response language tag
    pub language: String,
    /// Backends to seat, in speaking order. Empty seats every backend that
    /// has a credential.
    pub backends: Vec<BackendId>,
    /// Timeout in seconds for each backend call
    pub timeout_seconds: Option<u64>,
    /// Max tokens requested per call
    pub max_tokens: u32,
}

impl Default for FileMeetingConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            evaluation_mode: EvaluationMode::default(),
            turn_order: TurnOrder::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            backends: Vec::new(),
            timeout_seconds: None,
            max_tokens: roundtable_application::DEFAULT_MAX_TOKENS,
        }
    }
}

impl FileMeetingConfig {
    /// Meeting configuration for `topic` with these defaults applied
    pub fn meeting_config(&self, topic: Topic) -> MeetingConfig {
        MeetingConfig::new(topic)
            .with_rounds(self.rounds)
            .with_evaluation_mode(self.evaluation_mode)
            .with_turn_order(self.turn_order)
            .with_language(Language::new(self.language.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meeting_section() {
        let toml_str = r#"
[meeting]
rounds = 3
evaluation_mode = "none"
turn_order = "random"
language = "en"
backends = ["claude", "gemini"]
timeout_seconds = 90
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let meeting = &config.meeting;
        assert_eq!(meeting.rounds, 3);
        assert_eq!(meeting.evaluation_mode, EvaluationMode::None);
        assert_eq!(meeting.turn_order, TurnOrder::Random);
        assert_eq!(meeting.backends, vec![BackendId::Claude, BackendId::Gemini]);
        assert_eq!(meeting.timeout_seconds, Some(90));
        assert_eq!(meeting.max_tokens, 4096);
    }

    #[test]
    fn test_meeting_config_applies_defaults() {
        let file = FileMeetingConfig {
            rounds: 4,
            language: "en".to_string(),
            ..Default::default()
        };
        let config = file.meeting_config(Topic::try_new("Tabs or spaces").unwrap());
        assert_eq!(config.rounds, 4);
        assert_eq!(config.language.tag(), "en");
        assert_eq!(config.evaluation_mode, EvaluationMode::Cross);
    }
}
