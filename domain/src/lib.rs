//! Domain layer for ai-roundtable
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Meeting
//!
//! A meeting is a structured discussion between several AI backends:
//!
//! - **Discussion**: participants speak in turn for a fixed number of rounds,
//!   each seeing everything said before them
//! - **Cross-evaluation**: each participant scores the others (optional)
//! - **Summary**: one participant condenses the whole meeting
//!
//! The [`Meeting`] aggregate enforces the phase machine; driving it against
//! real backends is the application layer's job.

pub mod backend;
pub mod core;
pub mod meeting;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use backend::{BackendId, ModelOption};
pub use core::{
    error::{DomainError, MIN_PARTICIPANTS},
    string::preview,
    topic::Topic,
};
pub use meeting::{
    config::{DEFAULT_LANGUAGE, DEFAULT_ROUNDS, EvaluationMode, Language, MeetingConfig, TurnOrder},
    entities::{Meeting, MeetingSnapshot, Phase},
    export::render_export,
    participant::{Participant, ParticipantSummary},
    stream_context::StreamContext,
    turn_order::{round_order, shuffle},
    value_objects::{
        Evaluation, MeetingRecord, TranscriptEntry, error_marker, is_error_marker,
        summary_error_marker,
    },
};
pub use prompt::{DiscussionPrompt, PromptTemplate};
pub use session::{
    entities::{Message, Role, split_system},
    stream::StreamEvent,
};
