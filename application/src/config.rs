//! Application-level configuration.
//!
//! Controls how the meeting orchestrator talks to backends, such as request
//! size and timeout limits.

use crate::ports::model_backend::{CompletionOptions, DEFAULT_MAX_TOKENS};
use std::time::Duration;

/// Application behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorConfig {
    /// Maximum tokens requested per backend call.
    pub max_tokens: u32,
    /// Maximum time a single backend call may take. A call that runs over
    /// is recorded as a failed turn.
    pub timeout: Option<Duration>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: None,
        }
    }
}

impl BehaviorConfig {
    /// Creates a BehaviorConfig from an optional timeout in seconds.
    ///
    /// If `seconds` is `None`, no timeout is applied.
    pub fn from_timeout_seconds(seconds: Option<u64>) -> Self {
        Self {
            timeout: seconds.map(Duration::from_secs),
            ..Self::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions::with_max_tokens(self.max_tokens)
    }
}
