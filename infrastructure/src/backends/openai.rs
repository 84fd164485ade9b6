//! Chat-completions adapter shared by ChatGPT and GitHub Models.
//!
//! Both vendors accept the OpenAI request shape with bearer auth; they
//! differ only in base URL and in the label used for error messages.

use super::{BackendSettings, capped_tokens};
use super::http::{build_client, check_status, read_event_stream, read_json, send};
use async_trait::async_trait;
use reqwest::Client;
use roundtable_application::{BackendError, ChunkCallback, CompletionOptions, ModelBackend};
use roundtable_domain::{BackendId, Message, StreamEvent};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GITHUB_MODELS_BASE_URL: &str = "https://models.github.ai/inference";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ReplyMessage>,
    delta: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamRecord {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    message: String,
}

/// Translate one chat-completions chunk into an event.
///
/// The `[DONE]` sentinel never reaches here; the SSE decoder drops it and
/// the stream simply ends.
pub(crate) fn decode_event(payload: &str) -> Option<StreamEvent> {
    let record: StreamRecord = serde_json::from_str(payload).ok()?;
    if let Some(error) = record.error {
        return Some(StreamEvent::Error(error.message));
    }
    record
        .choices
        .into_iter()
        .next()?
        .delta?
        .content
        .map(StreamEvent::Delta)
}

/// Backend speaking the chat-completions dialect
pub struct OpenAiCompatibleBackend {
    id: BackendId,
    vendor: &'static str,
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl OpenAiCompatibleBackend {
    /// ChatGPT on api.openai.com
    pub fn chatgpt(settings: BackendSettings) -> Result<Self, BackendError> {
        Self::build(BackendId::ChatGpt, "OpenAI", OPENAI_BASE_URL, settings)
    }

    /// GitHub Models inference endpoint, authenticated with a GitHub token
    pub fn copilot(settings: BackendSettings) -> Result<Self, BackendError> {
        Self::build(
            BackendId::Copilot,
            "GitHub Models",
            GITHUB_MODELS_BASE_URL,
            settings,
        )
    }

    fn build(
        id: BackendId,
        vendor: &'static str,
        default_base: &str,
        settings: BackendSettings,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            id,
            vendor,
            client: build_client()?,
            api_key: settings.api_key,
            model: settings.model,
            max_tokens: settings.max_tokens,
            base_url: settings
                .base_url
                .unwrap_or_else(|| default_base.to_string()),
        })
    }

    fn request_body<'a>(
        &'a self,
        messages: &'a [Message],
        options: &CompletionOptions,
        stream: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages,
            max_tokens: capped_tokens(self.max_tokens, options.max_tokens),
            stream,
        }
    }

    fn request(&self, body: &ChatRequest<'_>) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
    }
}

#[async_trait]
impl ModelBackend for OpenAiCompatibleBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, BackendError> {
        debug!(vendor = self.vendor, model = %self.model, "Chat completion request");
        let body = self.request_body(messages, options, false);
        let response = check_status(self.vendor, send(self.request(&body)).await?).await?;
        let parsed: ChatResponse = read_json(response).await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .map(|message| message.content.unwrap_or_default())
            .ok_or_else(|| BackendError::Decode("response has no choices".to_string()))
    }

    async fn complete_streaming(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<String, BackendError> {
        debug!(vendor = self.vendor, model = %self.model, "Chat completion streaming request");
        let body = self.request_body(messages, options, true);
        let response = check_status(self.vendor, send(self.request(&body)).await?).await?;
        read_event_stream(self.vendor, response, decode_event, on_chunk).await
    }
}
