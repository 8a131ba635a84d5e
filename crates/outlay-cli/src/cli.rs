//! Command-line interface definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "outlay", about = "AI-assisted expense tracker", version)]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true, default_value = "outlay.db")]
    pub db: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed default categories
    Init,

    /// Import a credit-card statement CSV
    Import {
        /// Path to the statement file
        #[arg(short, long)]
        file: PathBuf,

        /// Skip the auto-match pass after import
        #[arg(long)]
        no_match: bool,
    },

    /// Start the web server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 8081)]
        port: u16,

        /// Directory of static frontend files to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Directory for uploaded receipt and statement files
        #[arg(long, default_value = "uploads")]
        uploads_dir: PathBuf,
    },

    /// Show database status
    Status,
}
