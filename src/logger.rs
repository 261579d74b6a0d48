//! Logging setup via tracing-subscriber.
//!
//! Stdout carries the streamed chat replies, so log lines go to stderr, or
//! to `[app] log_file` when one is configured. Call [`init`] once, after the
//! effective level is known.

use std::fs::OpenOptions;
use std::path::Path;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Install the global subscriber.
///
/// `level` is an `EnvFilter` directive (`"warn"`, `"doc_chat=debug"`, ...).
/// With `prefer_level` (a `-v` flag was given) it beats `RUST_LOG`;
/// otherwise `RUST_LOG` wins when set and valid.
pub fn init(level: &str, prefer_level: bool, log_file: Option<&Path>) -> Result<(), AppError> {
    let filter = filter(level, prefer_level)?;
    let (writer, ansi) = match log_file {
        Some(path) => (BoxMakeWriter::new(open_log_file(path)?), false),
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

fn filter(level: &str, prefer_level: bool) -> Result<EnvFilter, AppError> {
    let from_level = || {
        EnvFilter::try_new(level).map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))
    };
    if prefer_level {
        return from_level();
    }
    EnvFilter::try_from_default_env().or_else(|_| from_level())
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<std::fs::File, AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Logger(format!("cannot create log dir '{}': {e}", parent.display())))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Logger(format!("failed to open log file '{}': {e}", path.display())))
}
