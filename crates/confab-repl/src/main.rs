use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use confab_core::session::SessionManager;
use confab_http::{HttpConversationService, HttpServiceConfig};

mod config;
mod render;
mod repl;

use config::ReplConfig;

#[derive(Parser)]
#[command(name = "confab")]
#[command(about = "Confab - a terminal chat client", long_about = None)]
struct Args {
    /// Base URL of the conversation backend
    #[arg(long, env = "CONFAB_BASE_URL")]
    base_url: Option<String>,

    /// Owner id recorded on conversations created from this client
    #[arg(long, env = "CONFAB_USER")]
    user: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = ReplConfig::load_or_default().context("loading configuration")?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(user) = args.user {
        config.user_id = user;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.timeout_secs = timeout_secs;
    }

    tracing::info!("Starting against {}", config.base_url);

    let service = HttpConversationService::new(HttpServiceConfig {
        base_url: config.base_url.clone(),
        timeout_secs: config.timeout_secs,
    })?;
    let manager = Arc::new(SessionManager::new(Arc::new(service), config.user_id));

    // A dead backend should not keep the client from starting; the user can
    // /refresh once it is reachable.
    if let Err(e) = manager.load_history().await {
        tracing::warn!("History load failed: {}", e);
        eprintln!("{}", format!("Could not load history: {}", e).yellow());
    }

    repl::run(manager).await
}

/// Sets up file-based tracing (logs go to ~/.config/confab/confab.log).
///
/// The filter comes from `CONFAB_LOG`, defaulting to `info`. When the log
/// file cannot be opened, diagnostics fall through to stderr instead.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("CONFAB_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    match config::open_log_file() {
        Ok(log_file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(log_file)
                .with_ansi(false)
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
