//! Entry point for the fluxgate binary.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("fluxgate=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Apply(args) => commands::apply::run(args).await,
        Commands::Ping(args) => commands::ping::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("fluxgate: {e}");
        std::process::exit(1);
    }
}
