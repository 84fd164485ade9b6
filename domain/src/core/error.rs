//! Domain error types

use crate::meeting::entities::Phase;
use thiserror::Error;

/// Minimum number of participants a meeting needs
pub const MIN_PARTICIPANTS: usize = 2;

/// Domain-level errors
///
/// Configuration problems are rejected before a meeting enters its state
/// machine; `InvalidTransition` and `RoundOutOfRange` guard the state
/// machine itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Topic cannot be empty")]
    EmptyTopic,

    #[error("Round count must be at least 1")]
    InvalidRounds,

    #[error("At least {required} participants with a usable credential are required (found {found})")]
    NotEnoughParticipants { required: usize, found: usize },

    #[error("Duplicate participant id: {0}")]
    DuplicateParticipant(String),

    #[error("Missing credential for backend: {0}")]
    MissingCredential(String),

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Participant {0} has already been evaluated")]
    DuplicateEvaluation(String),

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("Round {round} is outside 1..={total}")]
    RoundOutOfRange { round: u32, total: u32 },
}

impl DomainError {
    /// Check if this error is a configuration error (rejected before start)
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            DomainError::InvalidTransition { .. }
                | DomainError::RoundOutOfRange { .. }
                | DomainError::UnknownParticipant(_)
                | DomainError::DuplicateEvaluation(_)
        )
    }
}
