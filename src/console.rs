//! Console channel: reads lines, runs commands or prompts against the
//! [`Assistant`], and prints replies as they stream in.
//!
//! Input and output are injected so the loop can be driven from tests; the
//! binary wires them to stdin/stdout. Runs until `/quit`, end of input, or
//! the `shutdown` token is cancelled (Ctrl-C).

use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::assistant::{Assistant, Reply};
use crate::chat::{Role, UploadOutcome};
use crate::error::AppError;
use crate::extract;

const HELP: &str = "\
Commands:
  /upload <path>   attach a document to discuss (alias: /file)
  /doc             show the attached document
  /new             start a new conversation
  /history         print the conversation so far
  /types           list supported file types
  /about           show bot and model
  /ping            check that the LLM endpoint is reachable
  /help            this text
  /quit            leave (alias: /exit)
Anything else is sent to the chatbot.";

/// Display details for the banner and `/about`.
#[derive(Debug, Clone)]
pub struct ConsoleInfo {
    pub bot_name: String,
    pub model_label: String,
}

// ── Commands ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Prompt(String),
    /// Path argument; may be empty, which prints usage.
    Upload(String),
    Doc,
    New,
    History,
    Types,
    About,
    Ping,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Command::Prompt(line.to_string()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let cmd = match name.to_lowercase().as_str() {
            "upload" | "file" => Command::Upload(arg.to_string()),
            "doc" => Command::Doc,
            "new" => Command::New,
            "history" => Command::History,
            "types" => Command::Types,
            "about" => Command::About,
            "ping" => Command::Ping,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(name.to_string()),
        };
        Some(cmd)
    }
}

// ── run ───────────────────────────────────────────────────────────────────────

pub async fn run<R, W>(
    assistant: &mut Assistant,
    info: &ConsoleInfo,
    input: R,
    out: &mut W,
    shutdown: CancellationToken,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    info!(bot_name = %info.bot_name, "console started");
    print_banner(assistant, info, out)?;

    let mut lines = input.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let line = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                writeln!(out, "\nshutdown signal received, bye")?;
                info!("console shutting down");
                break;
            }

            line = lines.next_line() => line,
        };

        let input = match line {
            Err(e) => {
                warn!("console read error: {e}");
                break;
            }
            Ok(None) => {
                writeln!(out)?;
                info!("console input closed");
                break;
            }
            Ok(Some(input)) => input,
        };

        let Some(command) = Command::parse(&input) else { continue };
        debug!(?command, "console command");

        match command {
            Command::Quit => break,
            Command::Prompt(prompt) => {
                if !ask(assistant, info, &prompt, out, &shutdown).await? {
                    break;
                }
            }
            Command::Upload(path) if path.is_empty() => writeln!(out, "usage: /upload <path>")?,
            Command::Upload(path) => {
                if !upload(assistant, info, &path, out, &shutdown).await? {
                    break;
                }
            }
            Command::Doc => match assistant.conversation().document() {
                Some(doc) => writeln!(
                    out,
                    "Attached: '{}' ({} characters)",
                    doc.name,
                    doc.content.chars().count()
                )?,
                None => writeln!(out, "No document attached.")?,
            },
            Command::New => {
                assistant.new_conversation();
                print_last(assistant, info, 1, out)?;
            }
            Command::History => {
                let count = assistant.conversation().messages().len();
                print_last(assistant, info, count, out)?;
            }
            Command::Types => writeln!(out, "Supported: .{}", extract::supported_extensions().join(", ."))?,
            Command::About => {
                writeln!(out, "{}", info.bot_name)?;
                writeln!(out, "Model: {}", info.model_label)?;
                writeln!(out, "Active: {}", if assistant.is_active() { "yes" } else { "no" })?;
            }
            Command::Ping => match assistant.provider() {
                None => writeln!(out, "No LLM provider configured.")?,
                Some(p) => match p.ping().await {
                    Ok(()) => writeln!(out, "{} endpoint reachable.", p.name())?,
                    Err(e) => writeln!(out, "✗ {e}")?,
                },
            },
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Unknown(name) => writeln!(out, "unknown command '/{name}', try /help")?,
        }
    }

    Ok(())
}

/// One prompt round. Returns `false` when shutdown interrupted the reply.
async fn ask<W: Write>(
    assistant: &mut Assistant,
    info: &ConsoleInfo,
    prompt: &str,
    out: &mut W,
    shutdown: &CancellationToken,
) -> Result<bool, AppError> {
    if assistant.is_active() {
        write!(out, "{}: ", info.bot_name)?;
        out.flush()?;
    }

    // The first write failure stops output; the reply is still recorded.
    let mut write_error: Option<std::io::Error> = None;
    let reply = {
        let sink = &mut *out;
        let write_error = &mut write_error;
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            reply = assistant.ask(prompt, |delta| {
                if write_error.is_some() {
                    return;
                }
                if let Err(e) = write!(sink, "{delta}").and_then(|()| sink.flush()) {
                    *write_error = Some(e);
                }
            }) => Some(reply),
        }
    };
    if let Some(e) = write_error {
        warn!("console write failed while streaming: {e}");
        return Err(e.into());
    }

    match reply {
        None => {
            writeln!(out, "\n[interrupted]")?;
            Ok(false)
        }
        Some(Reply::Answer(_)) => {
            writeln!(out)?;
            Ok(true)
        }
        Some(Reply::Fallback { error, text }) => {
            writeln!(out)?;
            writeln!(out, "✗ Oops! An error occurred: {error}")?;
            writeln!(out, "{}: {text}", info.bot_name)?;
            Ok(true)
        }
        Some(Reply::Inactive) => {
            writeln!(
                out,
                "⚠ The chatbot is inactive because the API key has not been configured correctly."
            )?;
            Ok(true)
        }
    }
}

/// Upload one file. Returns `false` when shutdown interrupted it.
async fn upload<W: Write>(
    assistant: &mut Assistant,
    info: &ConsoleInfo,
    path: &str,
    out: &mut W,
    shutdown: &CancellationToken,
) -> Result<bool, AppError> {
    let outcome = tokio::select! {
        biased;
        _ = shutdown.cancelled() => None,
        outcome = assistant.upload_path(Path::new(path)) => Some(outcome),
    };

    match outcome {
        None => {
            writeln!(out, "[interrupted]")?;
            Ok(false)
        }
        Some(outcome) => {
            print_outcome(assistant, info, &outcome, out)?;
            Ok(true)
        }
    }
}

fn print_banner<W: Write>(assistant: &Assistant, info: &ConsoleInfo, out: &mut W) -> Result<(), AppError> {
    writeln!(out, "─────────────────────────────────")?;
    writeln!(out, " 🤖 {}", info.bot_name)?;
    writeln!(out, "─────────────────────────────────")?;
    writeln!(
        out,
        "Type your message, or /upload <path> to discuss a document (.{}). /help for commands.",
        extract::supported_extensions().join(", .")
    )?;
    writeln!(out, "Model: {}", info.model_label)?;
    if !assistant.is_active() {
        writeln!(
            out,
            "✗ API key not found. Set LLM_API_KEY or OPENROUTER_API_KEY to enable the chatbot."
        )?;
    }
    print_last(assistant, info, assistant.conversation().messages().len(), out)
}

fn print_outcome<W: Write>(
    assistant: &Assistant,
    info: &ConsoleInfo,
    outcome: &UploadOutcome,
    out: &mut W,
) -> Result<(), AppError> {
    match outcome {
        UploadOutcome::Attached { announced, .. } => {
            writeln!(out, "✓ {outcome}")?;
            if *announced {
                print_last(assistant, info, 2, out)?;
            }
        }
        UploadOutcome::NoText { .. } => writeln!(out, "ℹ {outcome}")?,
        UploadOutcome::Failed { .. } => writeln!(out, "✗ {outcome}")?,
    }
    Ok(())
}

/// Print the last `n` chat turns.
fn print_last<W: Write>(assistant: &Assistant, info: &ConsoleInfo, n: usize, out: &mut W) -> Result<(), AppError> {
    let messages = assistant.conversation().messages();
    for m in &messages[messages.len().saturating_sub(n)..] {
        let who = match m.role {
            Role::User => "you",
            Role::Assistant => info.bot_name.as_str(),
            Role::System => "system",
        };
        writeln!(out, "{who}: {}", m.content)?;
    }
    Ok(())
}
