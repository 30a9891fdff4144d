mod candidates;
mod cli;
mod commands;
mod config;
mod document;
mod llm;
mod model;
mod pipeline;
mod store;
#[cfg(test)]
mod test_support;
mod util;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, ExtractArgs};
use crate::config::AppConfig;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Some(Commands::Extract(args)) => commands::extract::run(args, &config),
        Some(Commands::Candidates(args)) => commands::candidates::run(args),
        Some(Commands::Inventory(args)) => commands::inventory::run(args),
        Some(Commands::List(args)) => commands::review::list(args, &config),
        Some(Commands::Delete(args)) => commands::review::delete(args, &config),
        None => commands::extract::run(
            ExtractArgs {
                dir: PathBuf::from("."),
                ..ExtractArgs::default()
            },
            &config,
        ),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
