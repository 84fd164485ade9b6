//! Model conversation primitives.
//!
//! - [`entities::Message`]: a role-tagged message sent to a backend
//! - [`stream::StreamEvent`]: one decoded record of a streamed response

pub mod entities;
pub mod stream;
