//! regchat - Streaming regulatory-intelligence chat CLI
//!
//! Main entry point for the regchat application.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use regchat::cli::{Cli, Commands};
use regchat::commands;
use regchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // If the user supplied a storage path on the CLI (or via env),
    // mirror it into REGCHAT_HISTORY_DB so the config loader and the
    // storage initializer both pick it up.
    if let Some(db_path) = &cli.storage_path {
        std::env::set_var("REGCHAT_HISTORY_DB", db_path);
        tracing::info!("Using storage DB override from CLI: {}", db_path);
    }

    // Load and validate configuration
    let config = Config::load(&cli.config)?;
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { resume } => {
            tracing::info!("Starting interactive chat mode");
            commands::chat::run_chat(config, resume).await
        }
        Commands::History { command } => commands::history::handle_history(&config, command),
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "regchat=debug" } else { "regchat=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
