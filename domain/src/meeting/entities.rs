//! Meeting entities: the phase state machine and the meeting aggregate.

use super::config::MeetingConfig;
use super::export::render_export;
use super::participant::Participant;
use super::value_objects::{Evaluation, MeetingRecord, TranscriptEntry};
use crate::core::error::{DomainError, MIN_PARTICIPANTS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lifecycle stage of a meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Discussion,
    Evaluation,
    Summary,
    Completed,
    Paused,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Discussion => "discussion",
            Phase::Evaluation => "evaluation",
            Phase::Summary => "summary",
            Phase::Completed => "completed",
            Phase::Paused => "paused",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Discussion => "Discussion",
            Phase::Evaluation => "Cross-Evaluation",
            Phase::Summary => "Summary",
            Phase::Completed => "Completed",
            Phase::Paused => "Paused",
        }
    }

    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// `paused` is a side-state of `discussion` only. `completed` is terminal
    /// and reachable from every other phase (forced stop).
    pub fn can_transition_to(&self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (Completed, _) => false,
            (_, Completed) => true,
            (Idle, Discussion) => true,
            (Discussion, Paused | Evaluation | Summary) => true,
            (Paused, Discussion) => true,
            (Evaluation, Summary) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only view of a meeting at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSnapshot {
    pub phase: Phase,
    pub topic: String,
    pub current_round: u32,
    pub total_rounds: u32,
    pub participants: Vec<Participant>,
    pub transcript: Vec<TranscriptEntry>,
    pub evaluations: Vec<Evaluation>,
    pub summary: String,
}

/// A roundtable meeting (Aggregate)
///
/// Owns all accumulating state and enforces the phase and round invariants.
/// Async sequencing lives in the application layer; every mutation goes
/// through here.
#[derive(Debug, Clone)]
pub struct Meeting {
    config: MeetingConfig,
    participants: Vec<Participant>,
    phase: Phase,
    current_round: u32,
    transcript: Vec<TranscriptEntry>,
    evaluations: Vec<Evaluation>,
    summary: String,
    record: Option<MeetingRecord>,
}

impl Meeting {
    /// Create an idle meeting, rejecting invalid configurations
    pub fn new(config: MeetingConfig, participants: Vec<Participant>) -> Result<Self, DomainError> {
        config.validate()?;

        if participants.len() < MIN_PARTICIPANTS {
            return Err(DomainError::NotEnoughParticipants {
                required: MIN_PARTICIPANTS,
                found: participants.len(),
            });
        }

        let mut seen = HashSet::new();
        for participant in &participants {
            if !seen.insert(participant.id()) {
                return Err(DomainError::DuplicateParticipant(
                    participant.id().to_string(),
                ));
            }
        }

        Ok(Self {
            config,
            participants,
            phase: Phase::Idle,
            current_round: 0,
            transcript: Vec::new(),
            evaluations: Vec::new(),
            summary: String::new(),
            record: None,
        })
    }

    pub fn config(&self) -> &MeetingConfig {
        &self.config
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn total_rounds(&self) -> u32 {
        self.config.rounds
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn record(&self) -> Option<&MeetingRecord> {
        self.record.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        self.phase.is_terminal()
    }

    /// The participant whose backend writes the summary
    pub fn summary_participant(&self) -> &Participant {
        // `new` guarantees at least MIN_PARTICIPANTS entries
        &self.participants[0]
    }

    fn participant(&self, id: &str) -> Result<&Participant, DomainError> {
        self.participants
            .iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| DomainError::UnknownParticipant(id.to_string()))
    }

    /// Move to `next`, enforcing the state machine
    pub fn transition(&mut self, next: Phase) -> Result<(), DomainError> {
        if !self.phase.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    fn in_discussion(&self) -> bool {
        matches!(self.phase, Phase::Discussion | Phase::Paused)
    }

    fn require_discussion(&self) -> Result<(), DomainError> {
        if self.in_discussion() {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                from: self.phase,
                to: Phase::Discussion,
            })
        }
    }

    /// Advance to the next round and return its number
    pub fn begin_round(&mut self) -> Result<u32, DomainError> {
        self.require_discussion()?;
        let next = self.current_round + 1;
        if next > self.config.rounds {
            return Err(DomainError::RoundOutOfRange {
                round: next,
                total: self.config.rounds,
            });
        }
        self.current_round = next;
        Ok(next)
    }

    /// Entries participant `participant_id` may see when speaking in `round`:
    /// every earlier round in full plus same-round turns by others.
    pub fn discussion_context(&self, participant_id: &str, round: u32) -> Vec<&TranscriptEntry> {
        self.transcript
            .iter()
            .filter(|t| t.round < round || (t.round == round && t.participant != participant_id))
            .collect()
    }

    /// Append a finalized turn for the active round
    pub fn record_turn(
        &mut self,
        participant_id: &str,
        content: impl Into<String>,
    ) -> Result<&TranscriptEntry, DomainError> {
        self.require_discussion()?;
        if self.current_round == 0 {
            return Err(DomainError::RoundOutOfRange {
                round: 0,
                total: self.config.rounds,
            });
        }
        let entry = TranscriptEntry::new(self.participant(participant_id)?, self.current_round, content);
        self.transcript.push(entry);
        Ok(&self.transcript[self.transcript.len() - 1])
    }

    /// Append one participant's evaluation (at most one each)
    pub fn record_evaluation(
        &mut self,
        participant_id: &str,
        content: impl Into<String>,
    ) -> Result<&Evaluation, DomainError> {
        if self.phase != Phase::Evaluation {
            return Err(DomainError::InvalidTransition {
                from: self.phase,
                to: Phase::Evaluation,
            });
        }
        if self.evaluations.iter().any(|e| e.evaluator == participant_id) {
            return Err(DomainError::DuplicateEvaluation(participant_id.to_string()));
        }
        let evaluation = Evaluation::new(self.participant(participant_id)?, content);
        self.evaluations.push(evaluation);
        Ok(&self.evaluations[self.evaluations.len() - 1])
    }

    pub fn set_summary(&mut self, content: impl Into<String>) -> Result<(), DomainError> {
        if self.phase != Phase::Summary {
            return Err(DomainError::InvalidTransition {
                from: self.phase,
                to: Phase::Summary,
            });
        }
        self.summary = content.into();
        Ok(())
    }

    /// Render the export document for the current state
    pub fn export(&self, generated_at: DateTime<Utc>) -> String {
        let participants: Vec<_> = self.participants.iter().map(Participant::summary).collect();
        render_export(
            self.config.topic.content(),
            &participants,
            &self.transcript,
            &self.evaluations,
            &self.summary,
            generated_at,
        )
    }

    /// Force the meeting to `completed` and build its record.
    ///
    /// The record is created exactly once; later calls return the same one.
    pub fn finalize(&mut self, at: DateTime<Utc>) -> &MeetingRecord {
        self.phase = Phase::Completed;
        let Self {
            config,
            participants,
            transcript,
            evaluations,
            summary,
            record,
            ..
        } = self;
        record.get_or_insert_with(|| {
            let participants: Vec<_> = participants.iter().map(Participant::summary).collect();
            let markdown = render_export(
                config.topic.content(),
                &participants,
                transcript,
                evaluations,
                summary,
                at,
            );
            MeetingRecord {
                id: MeetingRecord::id_for(at, rand::random()),
                topic: config.topic.content().to_string(),
                participants,
                rounds: config.rounds,
                transcript: transcript.clone(),
                evaluations: evaluations.clone(),
                summary: summary.clone(),
                markdown,
                created_at: at,
            }
        })
    }

    pub fn snapshot(&self) -> MeetingSnapshot {
        MeetingSnapshot {
            phase: self.phase,
            topic: self.config.topic.content().to_string(),
            current_round: self.current_round,
            total_rounds: self.config.rounds,
            participants: self.participants.clone(),
            transcript: self.transcript.clone(),
            evaluations: self.evaluations.clone(),
            summary: self.summary.clone(),
        }
    }
}
