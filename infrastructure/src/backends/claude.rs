//! Anthropic Messages API adapter.
//!
//! System instructions travel in the top-level `system` field, not in the
//! message list. Stream text arrives in `content_block_delta` events.

use super::{BackendSettings, capped_tokens};
use super::http::{build_client, check_status, read_event_stream, read_json, send};
use async_trait::async_trait;
use reqwest::Client;
use roundtable_application::{BackendError, ChunkCallback, CompletionOptions, ModelBackend};
use roundtable_domain::{BackendId, Message, StreamEvent, split_system};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const VENDOR: &str = "Claude";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct StreamRecord {
    #[serde(rename = "type")]
    kind: String,
    delta: Option<TextDelta>,
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct TextDelta {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    message: String,
}

/// Translate one stream payload into an event
pub(crate) fn decode_event(payload: &str) -> Option<StreamEvent> {
    let record: StreamRecord = serde_json::from_str(payload).ok()?;
    match record.kind.as_str() {
        "content_block_delta" => record.delta?.text.map(StreamEvent::Delta),
        "message_stop" => Some(StreamEvent::Done),
        "error" => record.error.map(|e| StreamEvent::Error(e.message)),
        _ => None,
    }
}

/// Claude backend bound to one API key and model
pub struct ClaudeBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl ClaudeBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client()?,
            api_key: settings.api_key,
            model: settings.model,
            max_tokens: settings.max_tokens,
            base_url: settings
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    fn request_body<'a>(
        &'a self,
        messages: &'a [Message],
        options: &CompletionOptions,
        stream: bool,
    ) -> MessagesRequest<'a> {
        let (system, conversation) = split_system(messages);
        MessagesRequest {
            model: &self.model,
            max_tokens: capped_tokens(self.max_tokens, options.max_tokens),
            system: system.filter(|s| !s.is_empty()),
            messages: conversation
                .into_iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream,
        }
    }

    fn request(&self, body: &MessagesRequest<'_>) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
    }
}

#[async_trait]
impl ModelBackend for ClaudeBackend {
    fn id(&self) -> BackendId {
        BackendId::Claude
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, BackendError> {
        debug!(model = %self.model, "Claude request");
        let body = self.request_body(messages, options, false);
        let response = check_status(VENDOR, send(self.request(&body)).await?).await?;
        let parsed: MessagesResponse = read_json(response).await?;
        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| BackendError::Decode("response has no content blocks".to_string()))
    }

    async fn complete_streaming(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<String, BackendError> {
        debug!(model = %self.model, "Claude streaming request");
        let body = self.request_body(messages, options, true);
        let response = check_status(VENDOR, send(self.request(&body)).await?).await?;
        read_event_stream(VENDOR, response, decode_event, on_chunk).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> ClaudeBackend {
        ClaudeBackend::new(BackendSettings::new("sk-test", "claude-haiku-4-5-20251001")).unwrap()
    }

    #[test]
    fn test_system_moves_to_top_level_field() {
        let backend = backend();
        let messages = vec![
            Message::system("Be brief"),
            Message::user("Hi"),
            Message::assistant("Hello"),
        ];
        let body = backend.request_body(&messages, &CompletionOptions::default(), true);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["system"], "Be brief");
        assert_eq!(json["model"], "claude-haiku-4-5-20251001");
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["stream"], true);
        let wire = json["messages"].as_array().unwrap();
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0]["role"], "user");
        assert_eq!(wire[1]["role"], "assistant");
    }

    #[test]
    fn test_no_system_and_no_stream_fields_when_unused() {
        let backend = backend();
        let messages = vec![Message::user("Hi")];
        let body = backend.request_body(&messages, &CompletionOptions::with_max_tokens(10), false);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert!(json.get("stream").is_none());
        assert_eq!(json["max_tokens"], 10);
    }

    #[test]
    fn test_decode_events() {
        assert_eq!(
            decode_event(r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#),
            Some(StreamEvent::Delta("Hi".to_string()))
        );
        assert_eq!(decode_event(r#"{"type":"message_stop"}"#), Some(StreamEvent::Done));
        assert_eq!(
            decode_event(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#),
            Some(StreamEvent::Error("Overloaded".to_string()))
        );
        assert_eq!(decode_event(r#"{"type":"ping"}"#), None);
        assert_eq!(decode_event(r#"{"type":"content_block_delta""#), None);
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(backend().base_url, DEFAULT_BASE_URL);
    }
}
