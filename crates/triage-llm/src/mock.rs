//! Deterministic in-process completion client.
//!
//! The default provider: no network, stable output, word-sized stream
//! chunks. Tests use it directly; `failing()` builds a variant whose
//! calls always error, for exercising fallback paths.

use async_trait::async_trait;
use futures::stream;
use tracing::debug;

use crate::{ChatMessage, ChatRole, Completion, CompletionClient, CompletionStream, LlmError};

const DEFAULT_RESPONSE: &str = "Based on the gathered evidence, start with the \
highest-correlation recent change and apply the documented resolution steps \
from the matching historical incidents.";

/// Deterministic completion client.
#[derive(Debug, Clone)]
pub struct MockCompletionClient {
    response: String,
    fail: bool,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self {
            response: DEFAULT_RESPONSE.to_string(),
            fail: false,
        }
    }

    /// A client that always returns the given text.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            fail: false,
        }
    }

    /// A client whose every call fails with a provider error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            fail: true,
        }
    }

    fn render(&self, messages: &[ChatMessage]) -> String {
        let user_turns = messages
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .count();
        debug!(messages = messages.len(), user_turns, "Mock completion");
        self.response.clone()
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        if self.fail {
            return Err(LlmError::Provider("mock provider configured to fail".into()));
        }
        Ok(Completion {
            content: self.render(messages),
        })
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<CompletionStream, LlmError> {
        if self.fail {
            return Err(LlmError::Provider("mock provider configured to fail".into()));
        }
        let chunks: Vec<Result<String, LlmError>> = self
            .render(messages)
            .split_inclusive(' ')
            .map(|word| Ok(word.to_string()))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn complete_is_deterministic() {
        let client = MockCompletionClient::with_response("restart the pool");
        let messages = [ChatMessage::user("what should I do?")];

        let first = client.complete(&messages).await.unwrap();
        let second = client.complete(&messages).await.unwrap();
        assert_eq!(first.content, second.content);
        assert_eq!(first.content, "restart the pool");
    }

    #[tokio::test]
    async fn stream_chunks_reassemble_to_the_full_response() {
        let client = MockCompletionClient::with_response("check the recent deploy first");
        let mut stream = client.stream(&[ChatMessage::user("hi")]).await.unwrap();

        let mut assembled = String::new();
        let mut chunks = 0;
        while let Some(chunk) = stream.next().await {
            assembled.push_str(&chunk.unwrap());
            chunks += 1;
        }
        assert_eq!(assembled, "check the recent deploy first");
        assert!(chunks > 1);
    }

    #[tokio::test]
    async fn failing_client_errors_on_both_paths() {
        let client = MockCompletionClient::failing();
        assert!(client.complete(&[]).await.is_err());
        assert!(client.stream(&[]).await.is_err());
    }
}
