//! Topic value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// The subject a roundtable meeting discusses (Value Object)
///
/// Always non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic {
    content: String,
}

impl Topic {
    /// Create a topic, rejecting empty or whitespace-only input
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyTopic);
        }
        Ok(Self {
            content: trimmed.to_string(),
        })
    }

    /// Get the topic text
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<String> for Topic {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Topic::try_new(s)
    }
}

impl TryFrom<&str> for Topic {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Topic::try_new(s)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.content
    }
}
