//! Meeting domain
//!
//! - [`entities::Meeting`]: the aggregate owning transcript, evaluations and phase
//! - [`entities::Phase`]: the lifecycle state machine
//! - [`config::MeetingConfig`]: rounds, evaluation mode, turn order, language
//! - [`turn_order`]: per-round speaking order
//! - [`export`]: the markdown export document

pub mod config;
pub mod entities;
pub mod export;
pub mod participant;
pub mod stream_context;
pub mod turn_order;
pub mod value_objects;
