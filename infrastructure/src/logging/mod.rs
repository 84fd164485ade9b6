//! Logging infrastructure: structured meeting event logging.
//!
//! Provides [`JsonlMeetingLogger`], a JSONL file writer that implements
//! the [`MeetingUpdateSink`](roundtable_application::MeetingUpdateSink) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlMeetingLogger;
