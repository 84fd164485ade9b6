//! Output formatting for finished meetings

pub mod console;
