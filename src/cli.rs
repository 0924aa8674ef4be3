//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// MFlix - movie / series / anime catalog service
#[derive(Parser)]
#[command(name = "mflix")]
#[command(version)]
#[command(about = "Catalog service with an admin API and a gated download flow", long_about = None)]
pub struct Cli {
    /// Path to config.toml
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Apply database migrations and exit
    #[cfg(feature = "cli")]
    Migrate,

    /// Print an Argon2 hash for `api.admin_password`
    #[cfg(feature = "cli")]
    HashPassword {
        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },
}
