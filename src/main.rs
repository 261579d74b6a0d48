//! doc-chat console entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI args
//!   3. Load config
//!   4. Resolve effective log level (CLI `-v` flags > env > config)
//!   5. Init logger once
//!   6. Build the LLM provider (missing API key → inactive chatbot)
//!   7. Spawn Ctrl-C → shutdown signal watcher
//!   8. Upload the `--document`, if given
//!   9. Run the console until quit / EOF / shutdown

use clap::Parser;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use doc_chat::assistant::Assistant;
use doc_chat::cli::CliArgs;
use doc_chat::console::{self, ConsoleInfo};
use doc_chat::error::AppError;
use doc_chat::llm::{providers, ProviderError};
use doc_chat::{config, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    // A pending stdin read would otherwise hold up runtime shutdown.
    std::process::exit(0);
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level().unwrap_or(config.log_level.as_str());
    let force_cli_level = args.log_level().is_some();
    logger::init(effective_log_level, force_cli_level, config.log_file.as_deref())?;

    info!(
        bot_name = %config.bot_name,
        provider = %config.llm.provider,
        model = %config.llm.openai.model,
        log_level = %effective_log_level,
        "config loaded"
    );

    let provider = match providers::build(&config.llm, config.llm_api_key.clone()) {
        Ok(p) => Some(p),
        Err(ProviderError::MissingApiKey) => {
            error!("API key not found; chatbot will be inactive");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl-C: {e}");
                return;
            }
            info!("Ctrl-C received, shutting down");
            shutdown.cancel();
        });
    }

    let mut assistant = Assistant::new(
        config.documents.clone(),
        config.messages.clone(),
        provider,
        config.llm.stream,
    );

    let console_info = ConsoleInfo {
        bot_name: config.bot_name.clone(),
        model_label: config.model_label(),
    };

    if let Some(path) = &args.document {
        let outcome = assistant.upload_path(path).await;
        info!(path = %path.display(), %outcome, "startup document processed");
        println!("{outcome}");
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    console::run(&mut assistant, &console_info, stdin, &mut stdout, shutdown).await?;

    info!("bye");
    Ok(())
}
