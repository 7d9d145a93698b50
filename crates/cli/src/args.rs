//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// audience-tagger: tag media items as kids, teens, or adults using an LLM
#[derive(Parser, Debug)]
#[command(name = "audience-tagger")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify every eligible item in the library and tag it
    Run(RunArgs),

    /// One-shot classification of a single title
    Classify(ClassifyArgs),

    /// List the models a provider offers
    Models(ModelsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the library file
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// Replace existing audience tags for this run
    #[arg(long)]
    pub overwrite: bool,

    /// Override the pause between items, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Title to classify
    #[arg(long)]
    pub title: String,

    /// Release year
    #[arg(long)]
    pub year: Option<i32>,

    /// Synopsis
    #[arg(long)]
    pub overview: Option<String>,

    /// Content rating (e.g. PG-13)
    #[arg(long)]
    pub rating: Option<String>,

    /// Genre (repeatable)
    #[arg(long = "genre")]
    pub genres: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Provider name (defaults to the configured provider)
    #[arg(long)]
    pub provider: Option<String>,

    /// API key (defaults to the configured env var)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Endpoint for OpenAI-compatible providers
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
