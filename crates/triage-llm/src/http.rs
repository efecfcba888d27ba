//! OpenAI-compatible chat-completions client.
//!
//! One HTTP client serves both hosted OpenAI and self-hosted Ollama
//! deployments; Ollama exposes the same `/chat/completions` contract
//! under its `/v1` prefix. Streaming uses the SSE wire format: the
//! response body is a sequence of `data: {json}` lines terminated by
//! `data: [DONE]`.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ChatMessage, Completion, CompletionClient, CompletionStream, LlmError};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Completion client for OpenAI-compatible chat endpoints.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    http: reqwest::Client,
    provider: &'static str,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

impl HttpCompletionClient {
    /// Client for the hosted OpenAI API.
    pub fn openai(model: String, api_key: String, temperature: f64) -> Self {
        Self {
            http: reqwest::Client::new(),
            provider: "openai",
            base_url: OPENAI_BASE_URL.to_string(),
            model,
            api_key: Some(api_key),
            temperature,
        }
    }

    /// Client for a self-hosted Ollama instance.
    pub fn ollama(model: String, base_url: String, temperature: f64) -> Self {
        let base_url = format!("{}/v1", base_url.trim_end_matches('/'));
        Self {
            http: reqwest::Client::new(),
            provider: "ollama",
            base_url,
            model,
            api_key: None,
            temperature,
        }
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream,
        };
        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(
            provider = self.provider,
            model = %self.model,
            stream,
            "Sending chat completion request"
        );

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            warn!(provider = self.provider, %status, "Chat completion request rejected");
            return Err(LlmError::Provider(format!(
                "{} returned {status}: {detail}",
                self.provider
            )));
        }
        Ok(response)
    }
}

/// Turn an SSE chat-completion body into a stream of content deltas.
///
/// Chunk boundaries do not align with line boundaries, so a carry-over
/// buffer holds the trailing partial line between polls.
fn sse_delta_stream(response: reqwest::Response) -> CompletionStream {
    let state = (response.bytes_stream(), String::new(), VecDeque::new());
    Box::pin(futures::stream::unfold(
        state,
        |(mut bytes, mut buffer, mut pending)| async move {
            loop {
                if let Some(item) = pending.pop_front() {
                    return Some((item, (bytes, buffer, pending)));
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        match std::str::from_utf8(&chunk) {
                            Ok(text) => buffer.push_str(text),
                            Err(e) => {
                                pending.push_back(Err(LlmError::Stream(format!(
                                    "non-utf8 stream chunk: {e}"
                                ))));
                                continue;
                            }
                        }
                        while let Some(pos) = buffer.find('\n') {
                            let line = buffer[..pos].trim().to_string();
                            buffer.drain(..=pos);
                            let Some(data) = line.strip_prefix("data:") else {
                                continue;
                            };
                            let data = data.trim();
                            if data.is_empty() || data == "[DONE]" {
                                continue;
                            }
                            match serde_json::from_str::<StreamChunk>(data) {
                                Ok(parsed) => {
                                    let delta = parsed
                                        .choices
                                        .into_iter()
                                        .next()
                                        .and_then(|c| c.delta.content);
                                    if let Some(content) = delta {
                                        if !content.is_empty() {
                                            pending.push_back(Ok(content));
                                        }
                                    }
                                }
                                Err(e) => pending.push_back(Err(LlmError::Stream(format!(
                                    "malformed stream chunk: {e}"
                                )))),
                            }
                        }
                    }
                    Some(Err(e)) => {
                        return Some((Err(LlmError::Http(e)), (bytes, buffer, pending)));
                    }
                    None => {
                        return pending
                            .pop_front()
                            .map(|item| (item, (bytes, buffer, pending)));
                    }
                }
            }
        },
    ))
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    fn provider_name(&self) -> &str {
        self.provider
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        let response = self.send(messages, false).await?;
        let parsed: ChatCompletionResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                LlmError::Provider(format!("{} returned no completion choices", self.provider))
            })?;
        Ok(Completion { content })
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<CompletionStream, LlmError> {
        let response = self.send(messages, true).await?;
        Ok(sse_delta_stream(response))
    }
}
