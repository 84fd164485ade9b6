//! Meeting update events and the sink port that consumes them.
//!
//! The orchestrator emits [`MeetingUpdate`]s on an unbounded channel in the
//! order things happen. Consumers (console renderer, JSONL logger) implement
//! [`MeetingUpdateSink`] and are fed by whoever drains the channel.

use roundtable_domain::{MeetingRecord, Phase, StreamContext};
use serde::{Deserialize, Serialize};

/// One observable step of a running meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingUpdate {
    /// The meeting entered a new phase. Entering `completed` carries the
    /// finalized record, plus an error message when a fault ended it.
    PhaseChange {
        phase: Phase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        record: Option<Box<MeetingRecord>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    RoundStart {
        round: u32,
        total_rounds: u32,
    },
    RoundEnd {
        round: u32,
    },
    TurnStart {
        participant: String,
        participant_name: String,
        round: u32,
    },
    TurnEnd {
        participant: String,
        round: u32,
        content: String,
    },
    /// Incremental text; `context` is absent for discussion turns
    StreamChunk {
        participant: String,
        chunk: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<StreamContext>,
    },
    EvalStart {
        participant: String,
        participant_name: String,
    },
    EvalEnd {
        participant: String,
        content: String,
    },
    SummaryComplete {
        summary: String,
    },
}

impl MeetingUpdate {
    /// Stable event type identifier (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            MeetingUpdate::PhaseChange { .. } => "PHASE_CHANGE",
            MeetingUpdate::RoundStart { .. } => "ROUND_START",
            MeetingUpdate::RoundEnd { .. } => "ROUND_END",
            MeetingUpdate::TurnStart { .. } => "TURN_START",
            MeetingUpdate::TurnEnd { .. } => "TURN_END",
            MeetingUpdate::StreamChunk { .. } => "STREAM_CHUNK",
            MeetingUpdate::EvalStart { .. } => "EVAL_START",
            MeetingUpdate::EvalEnd { .. } => "EVAL_END",
            MeetingUpdate::SummaryComplete { .. } => "SUMMARY_COMPLETE",
        }
    }

    /// Finalized record, if this update completed the meeting
    pub fn record(&self) -> Option<&MeetingRecord> {
        match self {
            MeetingUpdate::PhaseChange {
                record: Some(record),
                ..
            } => Some(record),
            _ => None,
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            MeetingUpdate::PhaseChange {
                phase: Phase::Completed,
                ..
            }
        )
    }
}

/// Consumer of meeting updates
///
/// Implementations must not block: updates arrive while backends stream.
pub trait MeetingUpdateSink: Send + Sync {
    fn on_update(&self, update: &MeetingUpdate);
}

/// No-op sink for tests and when nothing is listening
pub struct NoUpdateSink;

impl MeetingUpdateSink for NoUpdateSink {
    fn on_update(&self, _update: &MeetingUpdate) {}
}

/// A sink that forwards every update to several inner sinks, in order.
pub struct CompositeUpdateSink<'a> {
    delegates: Vec<&'a dyn MeetingUpdateSink>,
}

impl<'a> CompositeUpdateSink<'a> {
    pub fn new(delegates: Vec<&'a dyn MeetingUpdateSink>) -> Self {
        Self { delegates }
    }
}

impl MeetingUpdateSink for CompositeUpdateSink<'_> {
    fn on_update(&self, update: &MeetingUpdate) {
        for d in &self.delegates {
            d.on_update(update);
        }
    }
}
