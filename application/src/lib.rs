//! Application layer for ai-roundtable
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::BehaviorConfig;
pub use ports::{
    meeting_repository::{CredentialStore, MeetingRepository, StorageError},
    meeting_update::{CompositeUpdateSink, MeetingUpdate, MeetingUpdateSink, NoUpdateSink},
    model_backend::{
        BackendError, ChunkCallback, CompletionOptions, DEFAULT_MAX_TOKENS, ModelBackend,
        PROBE_MAX_TOKENS,
    },
};
pub use use_cases::run_meeting::{
    MeetingHandle, RunMeetingError, RunMeetingInput, RunMeetingUseCase, Seat,
};
