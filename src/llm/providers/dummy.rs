//! Dummy LLM provider: echoes the latest user message back prefixed with
//! `[echo]`. Used for offline runs and for testing the full turn without a
//! real API key.

use crate::chat::{ChatMessage, Role};
use crate::llm::{LlmResponse, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    fn reply(messages: &[ChatMessage]) -> String {
        let last = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        format!("[echo] {last}")
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<LlmResponse, ProviderError> {
        Ok(LlmResponse { text: Self::reply(messages), usage: None })
    }

    /// Streams the echo one word (with its trailing space) at a time.
    pub async fn stream<F>(&self, messages: &[ChatMessage], mut on_delta: F) -> Result<String, ProviderError>
    where
        F: FnMut(&str),
    {
        let text = Self::reply(messages);
        for piece in text.split_inclusive(' ') {
            on_delta(piece);
        }
        Ok(text)
    }
}
