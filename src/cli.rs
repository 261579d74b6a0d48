//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Debug, Parser)]
#[command(name = "doc-chat", version, about = "Chat with an LLM about a document")]
pub struct CliArgs {
    /// Path to configuration file (default: config/default.toml)
    #[arg(short = 'f', long = "config", value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Upload this document before the first prompt
    #[arg(short, long, value_name = "PATH")]
    pub document: Option<PathBuf>,

    /// Increase logging verbosity (-v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// Log level forced by `-v` flags, if any.
    ///
    /// Each -v raises verbosity one tier:
    ///   -v      → warn
    ///   -vv     → info
    ///   -vvv    → debug
    ///   -vvvv+  → trace
    pub fn log_level(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("warn"),
            2 => Some("info"),
            3 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
