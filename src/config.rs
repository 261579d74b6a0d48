//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory (or
//! the file given with `-f`), then applies `DOC_CHAT_LOG_LEVEL`. Every
//! section is optional; a missing default file means "all defaults".
//!
//! The API key is never read from TOML: it comes from `LLM_API_KEY`, falling
//! back to `OPENROUTER_API_KEY`.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::chat::ContextMode;
use crate::error::AppError;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature; `None` leaves it to the provider. Never sent to
    /// models that forbid it.
    pub temperature: Option<f32>,
    /// Connect timeout, and the longest silence tolerated while reading a
    /// response, in seconds. Non-streaming requests also use it as a total
    /// deadline.
    pub timeout_seconds: u64,
    /// Refuse to start the provider without an API key.
    /// Turn off for keyless local servers.
    pub require_api_key: bool,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"dummy"`, `"openai"`, `"openrouter"`).
    /// Maps to `default` in `[llm]`.
    pub provider: String,
    /// Stream replies token by token instead of one blocking round-trip.
    pub stream: bool,
    pub openai: OpenAiConfig,
}

/// Upload handling.
#[derive(Debug, Clone)]
pub struct DocumentsConfig {
    pub context_mode: ContextMode,
    /// Add the "I have uploaded…" / "received the file…" pair to the chat.
    pub announce_uploads: bool,
    /// Files above this size are rejected before extraction.
    pub max_file_bytes: u64,
}

/// User-visible chat texts. `upload_user` and `upload_ack` take `{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub greeting: String,
    pub reset_greeting: String,
    pub fallback: String,
    pub upload_user: String,
    pub upload_ack: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            greeting: "Hi! I'm a chatbot ready to help you!".into(),
            reset_greeting: "Hi! Type your message here!".into(),
            fallback: "Sorry, I can't help you right now.".into(),
            upload_user: "I have uploaded the file: '{name}'. Please use the context from this file for my next questions.".into(),
            upload_ack: "Okay, I have received the file '{name}'. Go ahead and ask your questions about this document.".into(),
        }
    }
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    /// Append logs here instead of stderr.
    pub log_file: Option<PathBuf>,
    pub llm: LlmConfig,
    pub documents: DocumentsConfig,
    pub messages: MessagesConfig,
    /// From `LLM_API_KEY` / `OPENROUTER_API_KEY`; `None` for keyless setups.
    pub llm_api_key: Option<String>,
}

impl Config {
    /// Human-readable "provider / model" label.
    pub fn model_label(&self) -> String {
        match self.llm.provider.as_str() {
            "dummy" => "dummy (echo)".to_string(),
            p => format!("{} via {p}", self.llm.openai.model),
        }
    }
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    app: RawApp,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    documents: RawDocuments,
    #[serde(default)]
    messages: MessagesConfig,
}

#[derive(Deserialize)]
struct RawApp {
    #[serde(default = "default_bot_name")]
    bot_name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_file: Option<String>,
}

impl Default for RawApp {
    fn default() -> Self {
        Self { bot_name: default_bot_name(), log_level: default_log_level(), log_file: None }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default = "default_true")]
    stream: bool,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), stream: true, openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_true")]
    require_api_key: bool,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: None,
            timeout_seconds: default_openai_timeout_seconds(),
            require_api_key: true,
        }
    }
}

#[derive(Deserialize)]
struct RawDocuments {
    #[serde(default)]
    context_mode: ContextMode,
    #[serde(default = "default_true")]
    announce_uploads: bool,
    #[serde(default = "default_max_file_bytes")]
    max_file_bytes: u64,
}

impl Default for RawDocuments {
    fn default() -> Self {
        Self {
            context_mode: ContextMode::default(),
            announce_uploads: true,
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_bot_name() -> String { "Chatbot Assistant".to_string() }
fn default_log_level() -> String { "warn".to_string() }
fn default_llm_provider() -> String { "openrouter".to_string() }
fn default_openai_api_base_url() -> String { "https://openrouter.ai/api/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "deepseek/deepseek-r1-0528:free".to_string() }
fn default_openai_timeout_seconds() -> u64 { 120 }
fn default_max_file_bytes() -> u64 { 200 * 1024 * 1024 }

fn default_true() -> bool {
    true
}

/// Load config from `path` (or `config/default.toml`), then apply env-var
/// overrides.
///
/// An explicit path must exist; the default path may be absent.
pub fn load(path: Option<&Path>) -> Result<Config, AppError> {
    let log_level_override = env::var("DOC_CHAT_LOG_LEVEL").ok();
    let api_key = env::var("LLM_API_KEY")
        .ok()
        .or_else(|| env::var("OPENROUTER_API_KEY").ok())
        .filter(|k| !k.trim().is_empty());

    let path = match path {
        Some(p) => Some(p),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            default.exists().then_some(default)
        }
    };
    load_from(path, log_level_override.as_deref(), api_key)
}

/// Internal loader; accepts an explicit path and overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: Option<&Path>,
    log_level_override: Option<&str>,
    api_key: Option<String>,
) -> Result<Config, AppError> {
    let parsed: RawConfig = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
            toml::from_str(&raw)
                .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?
        }
        None => RawConfig::default(),
    };

    let app = parsed.app;
    let openai = parsed.llm.openai;

    if openai.timeout_seconds == 0 {
        return Err(AppError::Config("llm.openai.timeout_seconds must be greater than 0".into()));
    }
    if let Some(t) = openai.temperature.filter(|t| !(0.0..=2.0).contains(t)) {
        return Err(AppError::Config(format!(
            "llm.openai.temperature must be within 0.0..=2.0, got {t}"
        )));
    }
    if parsed.documents.max_file_bytes == 0 {
        return Err(AppError::Config("documents.max_file_bytes must be greater than 0".into()));
    }

    Ok(Config {
        bot_name: app.bot_name,
        log_level: log_level_override.unwrap_or(&app.log_level).to_string(),
        log_file: app.log_file.as_deref().map(expand_home),
        llm: LlmConfig {
            provider: parsed.llm.provider,
            stream: parsed.llm.stream,
            openai: OpenAiConfig {
                api_base_url: openai.api_base_url,
                model: openai.model,
                temperature: openai.temperature,
                timeout_seconds: openai.timeout_seconds,
                require_api_key: openai.require_api_key,
            },
        },
        documents: DocumentsConfig {
            context_mode: parsed.documents.context_mode,
            announce_uploads: parsed.documents.announce_uploads,
            max_file_bytes: parsed.documents.max_file_bytes,
        },
        messages: parsed.messages,
        llm_api_key: api_key,
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// `Config` for tests: dummy LLM, no API keys, no external calls.
impl Config {
    pub fn test_default() -> Self {
        Self {
            bot_name: "test".into(),
            log_level: "info".into(),
            log_file: None,
            llm: LlmConfig {
                provider: "dummy".into(),
                stream: true,
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: None,
                    timeout_seconds: 1,
                    require_api_key: false,
                },
            },
            documents: DocumentsConfig {
                context_mode: ContextMode::System,
                announce_uploads: true,
                max_file_bytes: 1024 * 1024,
            },
            messages: MessagesConfig::default(),
            llm_api_key: None,
        }
    }
}
