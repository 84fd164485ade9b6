//! HTTP plumbing shared by every vendor adapter.

use super::sse::SseDecoder;
use futures::StreamExt;
use reqwest::{Client, Response};
use roundtable_application::{BackendError, ChunkCallback};
use roundtable_domain::StreamEvent;
use serde::Deserialize;
use tracing::debug;

const USER_AGENT: &str = concat!("ai-roundtable/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client adapters share
pub fn build_client() -> Result<Client, BackendError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| BackendError::Connection(e.to_string()))
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Pull `error.message` out of a vendor error body, if it has one
pub fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()?
        .error?
        .message
        .filter(|m| !m.is_empty())
}

/// Send a prepared request, mapping transport failures
pub async fn send(request: reqwest::RequestBuilder) -> Result<Response, BackendError> {
    request
        .send()
        .await
        .map_err(|e| BackendError::Connection(e.to_string()))
}

/// Pass successful responses through; turn the rest into `BackendError::Api`.
///
/// The detail is the vendor's `error.message` when the body carries one,
/// otherwise the HTTP reason phrase.
pub async fn check_status(
    vendor: &'static str,
    response: Response,
) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = error_detail(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    });
    debug!(vendor, status = status.as_u16(), %detail, "Request rejected");
    Err(BackendError::Api {
        vendor,
        status: status.as_u16(),
        detail,
    })
}

/// Decode a JSON response body
pub async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    response
        .json()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

/// Accumulates decoded stream events into the full reply
pub struct StreamAccumulator<'a> {
    vendor: &'static str,
    on_chunk: ChunkCallback<'a>,
    text: String,
    done: bool,
}

impl<'a> StreamAccumulator<'a> {
    pub fn new(vendor: &'static str, on_chunk: ChunkCallback<'a>) -> Self {
        Self {
            vendor,
            on_chunk,
            text: String::new(),
            done: false,
        }
    }

    /// Apply one event; in-stream errors abort the call
    pub fn apply(&mut self, event: StreamEvent) -> Result<(), BackendError> {
        match event {
            StreamEvent::Delta(text) => {
                if !text.is_empty() {
                    (self.on_chunk)(&text);
                    self.text.push_str(&text);
                }
            }
            StreamEvent::Done => self.done = true,
            StreamEvent::Error(detail) => {
                return Err(BackendError::Stream {
                    vendor: self.vendor,
                    detail,
                });
            }
        }
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Read an SSE response to the end, forwarding each text delta.
///
/// `decode` turns one `data:` payload into an event; payloads it cannot
/// make sense of (malformed JSON, keep-alives) yield `None` and are skipped.
pub async fn read_event_stream(
    vendor: &'static str,
    response: Response,
    decode: fn(&str) -> Option<StreamEvent>,
    on_chunk: ChunkCallback<'_>,
) -> Result<String, BackendError> {
    let mut bytes = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut acc = StreamAccumulator::new(vendor, on_chunk);

    while let Some(chunk) = bytes.next().await {
        let chunk = chunk.map_err(|e| BackendError::Connection(e.to_string()))?;
        for payload in decoder.push(&chunk) {
            if let Some(event) = decode(&payload) {
                acc.apply(event)?;
            }
        }
        if acc.is_done() {
            break;
        }
    }
    if !acc.is_done()
        && let Some(payload) = decoder.finish()
        && let Some(event) = decode(&payload)
    {
        acc.apply(event)?;
    }

    Ok(acc.into_text())
}
