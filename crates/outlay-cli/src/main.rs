//! Outlay CLI - AI-assisted expense tracker
//!
//! Usage:
//!   outlay init                     Initialize database
//!   outlay import --file CSV       Import a credit-card statement
//!   outlay serve --port 8081       Start web server
//!   outlay status                  Show database status

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Import { file, no_match } => commands::cmd_import(&cli.db, &file, no_match),
        Commands::Serve {
            host,
            port,
            static_dir,
            uploads_dir,
        } => {
            commands::cmd_serve(&cli.db, &host, port, static_dir.as_deref(), &uploads_dir).await
        }
        Commands::Status => commands::cmd_status(&cli.db),
    }
}
