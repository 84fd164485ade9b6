//! Live progress while a meeting runs

pub mod reporter;
