//! Streaming events decoded from a backend's chunked response.
//!
//! Each vendor frames its stream differently; adapters translate one decoded
//! record into at most one [`StreamEvent`] so the accumulation loop stays
//! vendor-agnostic.

/// An event in a streaming model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A newly available text delta.
    Delta(String),
    /// The vendor signalled the end of the stream.
    Done,
    /// The vendor reported an error inside the stream.
    Error(String),
}
