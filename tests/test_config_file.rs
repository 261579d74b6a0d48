//! The shipped config/default.toml must parse and match the built-in defaults.

use std::path::Path;

use doc_chat::chat::ContextMode;
use doc_chat::config::{self, MessagesConfig};

#[test]
fn shipped_config_parses() {
    let cfg = config::load_from(Some(Path::new(config::DEFAULT_CONFIG_PATH)), None, None)
        .expect("config/default.toml should load");
    assert_eq!(cfg.llm.provider, "openrouter");
    assert_eq!(cfg.documents.context_mode, ContextMode::System);
    assert_eq!(cfg.documents.max_file_bytes, 200 * 1024 * 1024);
}

#[test]
fn shipped_config_matches_builtin_defaults() {
    let shipped = config::load_from(Some(Path::new(config::DEFAULT_CONFIG_PATH)), None, None).unwrap();
    let builtin = config::load_from(None, None, None).unwrap();
    assert_eq!(shipped.bot_name, builtin.bot_name);
    assert_eq!(shipped.log_level, builtin.log_level);
    assert_eq!(shipped.llm.openai.api_base_url, builtin.llm.openai.api_base_url);
    assert_eq!(shipped.llm.openai.model, builtin.llm.openai.model);
    assert_eq!(shipped.llm.openai.timeout_seconds, builtin.llm.openai.timeout_seconds);
    assert_eq!(shipped.llm.openai.temperature, None);
    assert_eq!(shipped.llm.openai.temperature, builtin.llm.openai.temperature);
    assert_eq!(shipped.messages, builtin.messages);
}

#[test]
fn upload_templates_have_name_placeholder() {
    let cfg = config::load_from(Some(Path::new(config::DEFAULT_CONFIG_PATH)), None, None).unwrap();
    assert!(cfg.messages.upload_user.contains("{name}"));
    assert!(cfg.messages.upload_ack.contains("{name}"));
    assert_ne!(cfg.messages.greeting, MessagesConfig::default().reset_greeting);
}
