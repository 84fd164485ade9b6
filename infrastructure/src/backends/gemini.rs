//! Google Gemini adapter.
//!
//! The API key travels as a query parameter. Assistant turns use the
//! `model` role and system instructions go in `systemInstruction`.

use super::{BackendSettings, capped_tokens};
use super::http::{build_client, check_status, read_event_stream, read_json, send};
use async_trait::async_trait;
use reqwest::Client;
use roundtable_application::{BackendError, ChunkCallback, CompletionOptions, ModelBackend};
use roundtable_domain::{BackendId, Message, Role, StreamEvent, split_system};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const VENDOR: &str = "Gemini";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Instruction<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Instruction<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ResponseError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseError {
    message: String,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        _ => "user",
    }
}

/// Translate one streamed response chunk into an event
pub(crate) fn decode_event(payload: &str) -> Option<StreamEvent> {
    let record: GenerateResponse = serde_json::from_str(payload).ok()?;
    if let Some(error) = record.error {
        return Some(StreamEvent::Error(error.message));
    }
    record.first_text().map(StreamEvent::Delta)
}

/// Gemini backend bound to one API key and model
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl GeminiBackend {
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
        &self,
        messages: &'a [Message],
        options: &CompletionOptions,
    ) -> GenerateRequest<'a> {
        let (system, conversation) = split_system(messages);
        GenerateRequest {
            contents: conversation
                .into_iter()
                .map(|m| Content {
                    role: wire_role(m.role),
                    parts: [Part { text: &m.content }],
                })
                .collect(),
            system_instruction: system
                .filter(|s| !s.is_empty())
                .map(|text| Instruction {
                    parts: [Part { text }],
                }),
            generation_config: GenerationConfig {
                max_output_tokens: capped_tokens(self.max_tokens, options.max_tokens),
            },
        }
    }

    fn endpoint(&self, stream: bool) -> String {
        if stream {
            format!(
                "{}/models/{}:streamGenerateContent?alt=sse&key={}",
                self.base_url, self.model, self.api_key
            )
        } else {
            format!(
                "{}/models/{}:generateContent?key={}",
                self.base_url, self.model, self.api_key
            )
        }
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn id(&self) -> BackendId {
        BackendId::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, BackendError> {
        debug!(model = %self.model, "Gemini request");
        let body = self.request_body(messages, options);
        let request = self.client.post(self.endpoint(false)).json(&body);
        let response = check_status(VENDOR, send(request).await?).await?;
        let parsed: GenerateResponse = read_json(response).await?;
        parsed
            .first_text()
            .ok_or_else(|| BackendError::Decode("response has no candidates".to_string()))
    }

    async fn complete_streaming(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<String, BackendError> {
        debug!(model = %self.model, "Gemini streaming request");
        let body = self.request_body(messages, options);
        let request = self.client.post(self.endpoint(true)).json(&body);
        let response = check_status(VENDOR, send(request).await?).await?;
        read_event_stream(VENDOR, response, decode_event, on_chunk).await
    }
}
