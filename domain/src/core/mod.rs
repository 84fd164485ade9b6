//! Core domain concepts shared across all subdomains.
//!
//! - [`topic::Topic`]: a validated meeting topic
//! - [`error::DomainError`]: domain-level errors
//! - [`string::preview`]: single-line, char-safe previews

pub mod error;
pub mod string;
pub mod topic;
