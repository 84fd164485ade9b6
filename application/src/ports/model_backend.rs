//! Model backend port
//!
//! Defines the interface every vendor adapter implements. Adapters live in
//! the infrastructure layer.

use async_trait::async_trait;
use roundtable_domain::{BackendId, Message, ModelOption, PromptTemplate};
use std::time::Duration;
use thiserror::Error;

/// Max tokens requested when the configuration does not choose
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Max tokens for the credential probe
pub const PROBE_MAX_TOKENS: u32 = 10;

/// Errors that can occur while talking to a backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Non-success HTTP status, annotated with the vendor's error detail
    #[error("{vendor} API error: {detail}")]
    Api {
        vendor: &'static str,
        status: u16,
        detail: String,
    },

    /// The vendor reported an error inside an already-open stream
    #[error("{vendor} API error: {detail}")]
    Stream {
        vendor: &'static str,
        detail: String,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Missing credential for {0}")]
    MissingCredential(BackendId),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// HTTP status when the failure came from the vendor
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Per-request options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
}

impl CompletionOptions {
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self { max_tokens }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Callback receiving each text delta as it is decoded
pub type ChunkCallback<'a> = &'a mut (dyn FnMut(&str) + Send);

/// A vendor model endpoint bound to one credential and model
///
/// The orchestrator only ever sees this trait, so vendors are swappable
/// and tests can script responses.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Which vendor this backend talks to
    fn id(&self) -> BackendId;

    /// Model identifier sent with each request
    fn model(&self) -> &str;

    /// Send messages and wait for the whole reply
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, BackendError>;

    /// Send messages and stream the reply.
    ///
    /// `on_chunk` receives every delta in order; the returned string is
    /// their concatenation. The default implementation delivers the
    /// non-streaming reply as a single chunk.
    async fn complete_streaming(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<String, BackendError> {
        let text = self.complete(messages, options).await?;
        if !text.is_empty() {
            on_chunk(&text);
        }
        Ok(text)
    }

    /// Selectable models for this vendor
    fn available_models(&self) -> &'static [ModelOption] {
        self.id().models()
    }

    /// Best-effort credential check: any successful minimal request counts
    /// as valid, any failure as invalid.
    async fn validate_credential(&self) -> bool {
        let probe = PromptTemplate::credential_probe();
        self.complete(&probe, &CompletionOptions::with_max_tokens(PROBE_MAX_TOKENS))
            .await
            .is_ok()
    }
}
