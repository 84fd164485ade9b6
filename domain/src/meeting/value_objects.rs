//! Meeting value objects - the immutable artifacts a meeting accumulates.
//!
//! - [`TranscriptEntry`] - one finalized discussion turn
//! - [`Evaluation`] - one participant's critique of the whole discussion
//! - [`MeetingRecord`] - the finalized artifact handed to storage

use super::participant::{Participant, ParticipantSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inline marker recorded when a discussion or evaluation call fails.
pub fn error_marker(message: &str) -> String {
    format!("[Error: {}]", message)
}

/// Inline marker recorded when the summary call fails.
pub fn summary_error_marker(message: &str) -> String {
    format!("[Summary generation failed: {}]", message)
}

/// Returns true if `content` is one of the inline failure markers.
pub fn is_error_marker(content: &str) -> bool {
    content.ends_with(']')
        && (content.starts_with("[Error: ") || content.starts_with("[Summary generation failed: "))
}

/// A single finalized discussion turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub participant: String,
    /// Display name snapshotted when the turn was taken
    pub participant_name: String,
    /// 1-indexed round number
    pub round: u32,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(participant: &Participant, round: u32, content: impl Into<String>) -> Self {
        Self {
            participant: participant.id().to_string(),
            participant_name: participant.name().to_string(),
            round,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        is_error_marker(&self.content)
    }
}

/// A participant's cross-evaluation of the discussion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub evaluator: String,
    pub evaluator_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Evaluation {
    pub fn new(evaluator: &Participant, content: impl Into<String>) -> Self {
        Self {
            evaluator: evaluator.id().to_string(),
            evaluator_name: evaluator.name().to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The finalized, immutable result of a meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub id: String,
    pub topic: String,
    pub participants: Vec<ParticipantSummary>,
    /// Total configured rounds (not necessarily all completed)
    pub rounds: u32,
    pub transcript: Vec<TranscriptEntry>,
    pub evaluations: Vec<Evaluation>,
    pub summary: String,
    /// Rendered export document
    pub markdown: String,
    pub created_at: DateTime<Utc>,
}

impl MeetingRecord {
    /// Record id from a creation time plus a random `suffix`, so records
    /// finalized in the same millisecond stay distinct
    pub fn id_for(created_at: DateTime<Utc>, suffix: u32) -> String {
        format!("meeting-{}-{:08x}", created_at.timestamp_millis(), suffix)
    }

    /// Number of transcript entries that carry an error marker
    pub fn failed_turns(&self) -> usize {
        self.transcript.iter().filter(|t| t.is_error()).count()
    }

    pub fn participant_names(&self) -> Vec<&str> {
        self.participants.iter().map(|p| p.name.as_str()).collect()
    }
}
