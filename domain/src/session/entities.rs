//! Role-tagged messages sent to model backends

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

/// Separate system instructions from the conversational messages.
///
/// Vendors that take system instructions outside the message list use this.
/// When several system messages are present the last one wins.
pub fn split_system(messages: &[Message]) -> (Option<&str>, Vec<&Message>) {
    let mut system = None;
    let mut conversation = Vec::with_capacity(messages.len());
    for message in messages {
        if message.is_system() {
            system = Some(message.content.as_str());
        } else {
            conversation.push(message);
        }
    }
    (system, conversation)
}
