//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod meeting_repository;
pub mod meeting_update;
pub mod model_backend;
