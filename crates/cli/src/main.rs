//! audience-tagger CLI entry point

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};
use config::{AppConfig, non_empty};

const DEFAULT_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = resolve_log_level(cli.log_level.as_deref(), cli.config.as_deref());
    init_logging(&log_level)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.config).await,
        Commands::Classify(args) => commands::classify::execute(args, cli.config).await,
        Commands::Models(args) => commands::models::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
    }
}

/// `--log-level` first, then `[general] log_level`, then info
///
/// A config that fails to load is reported by the command itself.
fn resolve_log_level(flag: Option<&str>, config_path: Option<&Path>) -> String {
    if let Some(level) = flag.and_then(non_empty) {
        return level;
    }

    AppConfig::load(config_path)
        .ok()
        .and_then(|config| non_empty(&config.general.log_level))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// `RUST_LOG` overrides the resolved level
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
