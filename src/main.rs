use clap::Parser;

use mflix::cli::{Cli, Commands};
use mflix::config::{get_config, init_config};
use mflix::runtime::modes;
use mflix::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config(cli.config.as_deref());

    let config = get_config();
    let _log_guard = init_logging(&config.logging)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => modes::run_server().await,
        #[cfg(feature = "cli")]
        Commands::Migrate => modes::run_migrate().await,
        #[cfg(feature = "cli")]
        Commands::HashPassword { stdin } => modes::run_hash_password(stdin),
    }
}
