//! # Triage LLM
//!
//! Completion clients for the summary and chat collaborator. The
//! orchestrator talks to a `CompletionClient` trait object; providers are
//! a deterministic mock (default configuration and tests) and an
//! OpenAI-compatible HTTP client that serves both hosted and self-hosted
//! (Ollama) deployments.
//!
//! Collaborator failures are ordinary `Result` values. Callers decide
//! what a failed completion means; the orchestrator falls back to a
//! deterministic summary.

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use triage_core::config::{LlmProvider, LlmSettings};

mod http;
mod mock;

pub use http::HttpCompletionClient;
pub use mock::MockCompletionClient;

/// Errors from the LLM collaborator.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure talking to the provider.
    #[error("llm http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider answered with an error or an unusable payload.
    #[error("llm provider error: {0}")]
    Provider(String),
    /// A streaming response broke mid-flight.
    #[error("llm stream error: {0}")]
    Stream(String),
    /// The client could not be built from the given settings.
    #[error("llm configuration error: {0}")]
    Config(String),
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A complete (non-streamed) model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
}

/// Incremental text chunks from a streamed completion.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// A chat-completion provider.
#[async_trait]
pub trait CompletionClient: std::fmt::Debug + Send + Sync {
    /// Stable provider name for logging.
    fn provider_name(&self) -> &str;

    /// Run a full completion and return the whole response.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError>;

    /// Run a streamed completion, yielding text chunks as they arrive.
    async fn stream(&self, messages: &[ChatMessage]) -> Result<CompletionStream, LlmError>;
}

/// Build the completion client selected by the settings.
pub fn build_client(settings: &LlmSettings) -> Result<Arc<dyn CompletionClient>, LlmError> {
    match settings.provider {
        LlmProvider::Mock => Ok(Arc::new(MockCompletionClient::new())),
        LlmProvider::OpenAi => {
            let api_key = settings
                .api_key
                .clone()
                .ok_or_else(|| LlmError::Config("openai provider requires an api key".into()))?;
            Ok(Arc::new(HttpCompletionClient::openai(
                settings.model.clone(),
                api_key,
                settings.temperature,
            )))
        }
        LlmProvider::Ollama => {
            let base_url = settings
                .base_url
                .clone()
                .ok_or_else(|| LlmError::Config("ollama provider requires a base url".into()))?;
            Ok(Arc::new(HttpCompletionClient::ollama(
                settings.model.clone(),
                base_url,
                settings.temperature,
            )))
        }
    }
}
