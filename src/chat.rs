//! Conversation state: the ordered list of chat turns, the attached
//! document, and assembly of the payload sent to the LLM.
//!
//! Everything here is in-process and single-owner; nothing is persisted.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::MessagesConfig;
use crate::extract::ExtractError;

// ── Messages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ── Context injection ─────────────────────────────────────────────────────────

/// Where the attached document's text goes in the outgoing payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// Never sent; the document is only implied by the upload messages.
    Off,
    /// System message at the head of the payload.
    #[default]
    System,
    /// System message right before the newest turn.
    BeforePrompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedDocument {
    pub name: String,
    pub content: String,
}

impl AttachedDocument {
    fn context_message(&self) -> ChatMessage {
        ChatMessage::system(format!(
            "Context from file '{}':\n{}",
            self.name, self.content
        ))
    }
}

// ── Upload outcome ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Text was extracted and is now the conversation's document.
    Attached { name: String, chars: usize, announced: bool },
    /// The file was read but held no extractable text.
    NoText { name: String },
    Failed { name: String, error: String },
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Attached { name, chars, .. } => {
                write!(f, "File '{name}' loaded ({chars} characters of text).")
            }
            UploadOutcome::NoText { name } => write!(
                f,
                "File '{name}' was processed but no extractable text content was found."
            ),
            UploadOutcome::Failed { name, error } => {
                write!(f, "Could not process file '{name}': {error}")
            }
        }
    }
}

// ── Conversation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    document: Option<AttachedDocument>,
    last_file_name: Option<String>,
    texts: MessagesConfig,
}

impl Conversation {
    /// Fresh conversation holding only the greeting.
    pub fn new(texts: MessagesConfig) -> Self {
        let messages = vec![ChatMessage::assistant(texts.greeting.clone())];
        Self { messages, document: None, last_file_name: None, texts }
    }

    /// Drop every turn and the document; leave only the reset greeting.
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::assistant(self.texts.reset_greeting.clone())];
        self.document = None;
        self.last_file_name = None;
        info!("conversation reset");
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn document(&self) -> Option<&AttachedDocument> {
        self.document.as_ref()
    }

    pub fn last_file_name(&self) -> Option<&str> {
        self.last_file_name.as_deref()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Fold an extraction result into the conversation.
    ///
    /// With `announce`, a successful upload appends a user/assistant
    /// confirmation pair, unless that exact pair already ends the history.
    pub fn apply_upload(
        &mut self,
        name: &str,
        extracted: Result<String, ExtractError>,
        announce: bool,
    ) -> UploadOutcome {
        self.last_file_name = Some(name.to_string());

        let text = match extracted {
            Ok(text) => text,
            Err(e) => {
                self.document = None;
                return UploadOutcome::Failed { name: name.to_string(), error: e.to_string() };
            }
        };

        if text.trim().is_empty() {
            self.document = None;
            return UploadOutcome::NoText { name: name.to_string() };
        }

        let chars = text.chars().count();
        self.document = Some(AttachedDocument { name: name.to_string(), content: text });

        let mut announced = false;
        if announce {
            let user_note = render_template(&self.texts.upload_user, name);
            let ack = render_template(&self.texts.upload_ack, name);
            if self.ends_with_pair(&user_note, &ack) {
                debug!(%name, "upload confirmation already present, not repeating");
            } else {
                self.push_user(user_note);
                self.push_assistant(ack);
                announced = true;
            }
        }

        info!(%name, chars, announced, "document attached");
        UploadOutcome::Attached { name: name.to_string(), chars, announced }
    }

    /// Messages to send, with the document injected according to `mode`.
    pub fn payload(&self, mode: ContextMode) -> Vec<ChatMessage> {
        let mut payload = self.messages.clone();
        let Some(doc) = &self.document else {
            return payload;
        };
        match mode {
            ContextMode::Off => {}
            ContextMode::System => payload.insert(0, doc.context_message()),
            ContextMode::BeforePrompt => {
                let at = payload.len().saturating_sub(1);
                payload.insert(at, doc.context_message());
            }
        }
        payload
    }

    fn ends_with_pair(&self, user: &str, assistant: &str) -> bool {
        match self.messages.as_slice() {
            [.., u, a] => {
                u.role == Role::User
                    && u.content == user
                    && a.role == Role::Assistant
                    && a.content == assistant
            }
            _ => false,
        }
    }
}

/// Substitute `{name}` in a message template.
pub fn render_template(template: &str, name: &str) -> String {
    template.replace("{name}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Conversation {
        Conversation::new(MessagesConfig::default())
    }

    #[test]
    fn starts_with_single_greeting() {
        let c = conversation();
        assert_eq!(c.messages().len(), 1);
        assert_eq!(c.messages()[0].role, Role::Assistant);
        assert_eq!(c.messages()[0].content, MessagesConfig::default().greeting);
    }

    #[test]
    fn reset_clears_document_and_history() {
        let mut c = conversation();
        c.apply_upload("a.txt", Ok("hello".into()), true);
        c.push_user("q");
        c.reset();
        assert_eq!(c.messages(), &[ChatMessage::assistant(MessagesConfig::default().reset_greeting)]);
        assert!(c.document().is_none());
        assert!(c.last_file_name().is_none());
    }

    #[test]
    fn upload_appends_confirmation_pair_once() {
        let mut c = conversation();
        let first = c.apply_upload("a.txt", Ok("hello".into()), true);
        assert_eq!(first, UploadOutcome::Attached { name: "a.txt".into(), chars: 5, announced: true });
        assert_eq!(c.messages().len(), 3);
        assert_eq!(c.messages()[1].role, Role::User);
        assert!(c.messages()[1].content.contains("'a.txt'"));
        assert_eq!(c.messages()[2].role, Role::Assistant);

        // Same file again straight away: no duplicate pair.
        let again = c.apply_upload("a.txt", Ok("hello".into()), true);
        assert!(matches!(again, UploadOutcome::Attached { announced: false, .. }));
        assert_eq!(c.messages().len(), 3);

        // After another turn the pair is no longer last, so it repeats.
        c.push_user("q");
        c.push_assistant("r");
        c.apply_upload("a.txt", Ok("hello".into()), true);
        assert_eq!(c.messages().len(), 7);
    }

    #[test]
    fn silent_upload_keeps_history() {
        let mut c = conversation();
        let out = c.apply_upload("a.md", Ok("# doc".into()), false);
        assert!(matches!(out, UploadOutcome::Attached { announced: false, .. }));
        assert_eq!(c.messages().len(), 1);
        assert_eq!(c.document().map(|d| d.content.as_str()), Some("# doc"));
    }

    #[test]
    fn blank_text_detaches_document() {
        let mut c = conversation();
        c.apply_upload("a.txt", Ok("hello".into()), false);
        let out = c.apply_upload("b.pdf", Ok(" \n\t".into()), true);
        assert_eq!(out, UploadOutcome::NoText { name: "b.pdf".into() });
        assert!(c.document().is_none());
        assert_eq!(c.last_file_name(), Some("b.pdf"));
        assert_eq!(c.messages().len(), 1);
    }

    #[test]
    fn failed_extraction_detaches_document() {
        let mut c = conversation();
        c.apply_upload("a.txt", Ok("hello".into()), false);
        let out = c.apply_upload("old.doc", Err(ExtractError::LegacyDoc), true);
        assert!(matches!(out, UploadOutcome::Failed { ref name, .. } if name == "old.doc"));
        assert!(out.to_string().contains(".docx"));
        assert!(c.document().is_none());
    }

    #[test]
    fn payload_without_document_is_history() {
        let mut c = conversation();
        c.push_user("hi");
        assert_eq!(c.payload(ContextMode::System), c.messages());
    }

    #[test]
    fn payload_injects_system_context_first() {
        let mut c = conversation();
        c.apply_upload("a.txt", Ok("facts".into()), false);
        c.push_user("question");
        let p = c.payload(ContextMode::System);
        assert_eq!(p.len(), 3);
        assert_eq!(p[0], ChatMessage::system("Context from file 'a.txt':\nfacts"));
        assert_eq!(p[2], ChatMessage::user("question"));
        // conversation itself untouched
        assert_eq!(c.messages().len(), 2);
    }

    #[test]
    fn payload_injects_before_prompt() {
        let mut c = conversation();
        c.apply_upload("a.txt", Ok("facts".into()), false);
        c.push_user("question");
        let p = c.payload(ContextMode::BeforePrompt);
        assert_eq!(p[1].role, Role::System);
        assert_eq!(p[2], ChatMessage::user("question"));
    }

    #[test]
    fn payload_off_omits_document() {
        let mut c = conversation();
        c.apply_upload("a.txt", Ok("facts".into()), true);
        assert!(c.payload(ContextMode::Off).iter().all(|m| m.role != Role::System));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("x")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"x"}"#);
    }
}
