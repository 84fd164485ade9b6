//! Prompt domain
//!
//! Templates for the discussion, evaluation and summary stages of a meeting.

mod template;

pub use template::{DiscussionPrompt, PromptTemplate};
