mod cli;
mod commands;
mod config;
mod offline;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,recall_memory=debug,recall_ai=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = config::CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => commands::run::run(args, config, cli.format).await,
    }
}
