//! Turn orchestration: uploads go through extraction into the conversation,
//! prompts go through payload assembly to the provider and back.
//!
//! The assistant owns the [`Conversation`]; channels (the console) only see
//! [`UploadOutcome`] and [`Reply`].

use std::path::Path;

use tracing::{error, info, warn};

use crate::chat::{Conversation, UploadOutcome};
use crate::config::{DocumentsConfig, MessagesConfig};
use crate::extract::{self, ExtractError, Upload};
use crate::llm::{LlmProvider, ProviderError};

/// Result of one prompt.
#[derive(Debug)]
pub enum Reply {
    Answer(String),
    /// The provider failed; `text` is the fallback that was recorded instead.
    Fallback { error: ProviderError, text: String },
    /// No provider is configured; nothing was recorded.
    Inactive,
}

impl Reply {
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Answer(text) | Reply::Fallback { text, .. } => Some(text),
            Reply::Inactive => None,
        }
    }
}

pub struct Assistant {
    conversation: Conversation,
    provider: Option<LlmProvider>,
    documents: DocumentsConfig,
    fallback: String,
    stream: bool,
}

impl Assistant {
    /// `provider` is `None` when the chatbot is inactive (no API key).
    pub fn new(
        documents: DocumentsConfig,
        messages: MessagesConfig,
        provider: Option<LlmProvider>,
        stream: bool,
    ) -> Self {
        let fallback = messages.fallback.clone();
        Self {
            conversation: Conversation::new(messages),
            provider,
            documents,
            fallback,
            stream,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn provider(&self) -> Option<&LlmProvider> {
        self.provider.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.provider.is_some()
    }

    pub fn new_conversation(&mut self) {
        self.conversation.reset();
    }

    /// Extract `upload` and fold the result into the conversation.
    ///
    /// Parsing runs on the blocking pool; large PDFs and workbooks can take a
    /// while.
    pub async fn upload(&mut self, upload: Upload) -> UploadOutcome {
        let name = upload.name.clone();
        let extracted = tokio::task::spawn_blocking(move || extract::extract(&upload))
            .await
            .unwrap_or_else(|e| Err(ExtractError::Aborted(e.to_string())));
        if let Err(e) = &extracted {
            warn!(%name, error = %e, "document extraction failed");
        }
        self.conversation
            .apply_upload(&name, extracted, self.documents.announce_uploads)
    }

    /// Read a file from disk and upload it under its file name.
    pub async fn upload_path(&mut self, path: &Path) -> UploadOutcome {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let failed = |error: String| UploadOutcome::Failed { name: name.clone(), error };

        let size = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => return failed("is a directory".into()),
            Ok(meta) => meta.len(),
            Err(e) => return failed(e.to_string()),
        };
        if size > self.documents.max_file_bytes {
            warn!(%name, size, limit = self.documents.max_file_bytes, "upload too large");
            return failed(format!(
                "file is {size} bytes; the limit is {} bytes",
                self.documents.max_file_bytes
            ));
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return failed(e.to_string()),
        };
        info!(%name, size, "upload read from disk");
        self.upload(Upload::new(name.clone(), bytes)).await
    }

    /// Send `prompt` with the conversation so far; deltas go to `on_delta`.
    ///
    /// On provider failure the fallback text is recorded as the reply so the
    /// history keeps alternating.
    pub async fn ask<F>(&mut self, prompt: &str, mut on_delta: F) -> Reply
    where
        F: FnMut(&str),
    {
        let Some(provider) = self.provider.as_ref() else {
            warn!("prompt ignored: chatbot inactive, API key not configured");
            return Reply::Inactive;
        };

        self.conversation.push_user(prompt);
        let payload = self.conversation.payload(self.documents.context_mode);

        let result = if self.stream {
            provider.stream(&payload, &mut on_delta).await
        } else {
            provider.complete(&payload).await.map(|resp| {
                on_delta(&resp.text);
                resp.text
            })
        };

        match result {
            Ok(text) => {
                self.conversation.push_assistant(text.clone());
                Reply::Answer(text)
            }
            Err(e) => {
                error!(error = %e, "completion failed, using fallback reply");
                let text = self.fallback.clone();
                self.conversation.push_assistant(text.clone());
                Reply::Fallback { error: e, text }
            }
        }
    }
}
