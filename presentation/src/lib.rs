//! Presentation layer for ai-roundtable
//!
//! This crate contains CLI definitions, output formatters,
//! and the live renderer for meeting updates.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, HistoryCommand, OutputFormat, RunArgs};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{LiveRenderer, UpdateRenderer};
