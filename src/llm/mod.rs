//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities; clone them freely.
//! Both entry points take the whole message list; conversation state is owned
//! by the caller.

pub mod providers;

use thiserror::Error;

use crate::chat::ChatMessage;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("API key not configured (set LLM_API_KEY or OPENROUTER_API_KEY)")]
    MissingApiKey,
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("response stream failed: {0}")]
    Stream(String),
}

// ── Response ──────────────────────────────────────────────────────────────────

/// Token counts reported by the provider, when it reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Option<LlmUsage>,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new match arms.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// One blocking round-trip; returns the whole reply.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<LlmResponse, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(messages).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(messages).await,
        }
    }

    /// Stream the reply, handing each text delta to `on_delta` as it arrives.
    /// Returns the concatenated reply.
    pub async fn stream<F>(&self, messages: &[ChatMessage], on_delta: F) -> Result<String, ProviderError>
    where
        F: FnMut(&str),
    {
        match self {
            LlmProvider::Dummy(p) => p.stream(messages, on_delta).await,
            LlmProvider::OpenAiCompatible(p) => p.stream(messages, on_delta).await,
        }
    }

    /// Reachability probe.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        match self {
            LlmProvider::Dummy(_) => Ok(()),
            LlmProvider::OpenAiCompatible(p) => p.ping().await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::OpenAiCompatible(_) => "openai-compatible",
        }
    }
}
