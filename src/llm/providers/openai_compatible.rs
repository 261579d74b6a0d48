//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! Speaks to OpenAI, OpenRouter, and local OpenAI-compatible servers
//! (Ollama, LM Studio…). All wire types are private to this module; callers
//! hand over [`ChatMessage`]s and get text back.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::chat::ChatMessage;
use crate::llm::{LlmResponse, LlmUsage, ProviderError};

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: Option<f32>,
    timeout: Duration,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from config values and an optional API key.
    ///
    /// `api_key` is `None` for keyless local models. When present it is sent
    /// as `Authorization: Bearer <key>` on every request.
    ///
    /// `timeout_seconds` bounds connecting and each read, so a stream stays
    /// alive as long as the server keeps sending. Only `complete` applies it
    /// to the whole request.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: Option<f32>,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let timeout = Duration::from_secs(timeout_seconds);
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, temperature, timeout, api_key })
    }

    /// Lightweight reachability probe.
    ///
    /// Sends a HEAD request to the configured endpoint. Any HTTP response
    /// (including 4xx) means the server is reachable. Only a transport-level
    /// failure (connection refused, timeout) is treated as unreachable.
    ///
    /// Uses a hard 5-second timeout regardless of the LLM timeout config.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build ping client: {e}")))?;
        let mut req = client.head(&self.api_base_url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req.send()
            .await
            .map(|_| ())
            .map_err(|e| ProviderError::Request(format!("unreachable: {e}")))
    }

    /// Single non-streaming round-trip over the full message list.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<LlmResponse, ProviderError> {
        let payload = self.request(messages, false);
        let response = self.send(&payload, Some(self.timeout)).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received LLM response");

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::Request("empty or missing content in response".into()))?;

        let usage = parsed.usage.map(|u| LlmUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(LlmResponse { text, usage })
    }

    /// Streaming round-trip (`stream: true`, server-sent events).
    ///
    /// Each non-null `choices[0].delta.content` is passed to `on_delta` and
    /// accumulated; `data: [DONE]` or end of body finishes the reply.
    pub async fn stream<F>(&self, messages: &[ChatMessage], mut on_delta: F) -> Result<String, ProviderError>
    where
        F: FnMut(&str),
    {
        let payload = self.request(messages, true);
        let response = self.send(&payload, None).await?;

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        let mut full = String::new();

        'read: while let Some(chunk) = body.next().await {
            let bytes = chunk.map_err(|e| {
                error!(error = %e, "LLM stream read failed");
                ProviderError::Stream(e.to_string())
            })?;
            for event in decoder.feed(&bytes) {
                match event {
                    SseEvent::Delta(text) => {
                        on_delta(&text);
                        full.push_str(&text);
                    }
                    SseEvent::Done => break 'read,
                    SseEvent::Error(message) => {
                        error!(%message, "LLM stream reported an error");
                        return Err(ProviderError::Stream(message));
                    }
                }
            }
        }

        debug!(reply_len = full.len(), "LLM stream finished");
        if full.trim().is_empty() {
            warn!("LLM stream produced no content");
        }
        Ok(full)
    }

    fn request<'a>(&self, messages: &'a [ChatMessage], stream: bool) -> ChatCompletionRequest<'a> {
        // Some models (gpt-5 family) do not accept a temperature parameter.
        let temperature = if self.model.starts_with("gpt-5") {
            None
        } else {
            self.temperature
        };

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|m| Message { role: m.role.as_str(), content: &m.content })
                .collect(),
            temperature,
            stream,
        }
    }

    /// POST `payload`; `deadline` caps the whole exchange when set.
    async fn send(
        &self,
        payload: &ChatCompletionRequest<'_>,
        deadline: Option<Duration>,
    ) -> Result<reqwest::Response, ProviderError> {
        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            messages = payload.messages.len(),
            stream = payload.stream,
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(deadline) = deadline {
            req = req.timeout(deadline);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "LLM HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        check_status(response).await
    }
}

// ── SSE decoding ──────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum SseEvent {
    Delta(String),
    Done,
    Error(String),
}

/// Incremental `text/event-stream` line decoder.
///
/// Network chunks can split a line (or a UTF-8 sequence) anywhere, so bytes
/// are buffered until a full `\n`-terminated line is available.
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = parse_sse_line(line.trim()) {
                events.push(event);
            }
        }
        events
    }
}

fn parse_sse_line(line: &str) -> Option<SseEvent> {
    // Blank separators, `: comment` keep-alives, and `event:`/`id:` fields.
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            if let Some(err) = chunk.error {
                return Some(SseEvent::Error(err.message));
            }
            chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta)
                .and_then(|d| d.content)
                .filter(|s| !s.is_empty())
                .map(SseEvent::Delta)
        }
        Err(e) => {
            warn!(error = %e, "skipping undecodable stream chunk");
            None
        }
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: String,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageData>,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = error_message(status, &body);
    error!(%status, %message, "LLM request returned HTTP error");
    Err(ProviderError::Request(message))
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(body) {
        let code = env.error.code.map(|v| match v {
            serde_json::Value::String(s) => format!(" [code={s}]"),
            other => format!(" [code={other}]"),
        }).unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    }
}
