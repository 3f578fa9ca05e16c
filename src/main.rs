// Entrypoint: parse flags, set up diagnostics, run the chat loop.

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ollama_chat::{new_session_id, ui::run_chat, ChatConfig};

#[derive(Parser)]
#[command(name = "ollama-chat")]
#[command(version, about = "Chat with an Ollama model.", long_about = None)]
struct Cli {
    /// Ollama model to use (defaults to $OLLAMA_MODEL or "mistral")
    #[arg(long)]
    model: Option<String>,

    /// Optional session ID
    #[arg(long)]
    session: Option<String>,

    /// Print debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let config = ChatConfig::from_env();
    let model = cli.model.unwrap_or_else(|| config.default_model.clone());
    let session_id = cli
        .session
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(new_session_id);
    debug!(%model, %session_id, "session configured");

    // Blocks until the user quits; a failed turn was already reported.
    let exit = run_chat(&config, &model, &session_id)?;
    debug!(?exit, "chat finished");
    Ok(())
}
