//! CLI mode
//!
//! Maintenance commands that run once and exit.

use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};
use tracing::info;

use crate::storage::StorageFactory;
use crate::utils::password::hash_password;

/// Connect and migrate; `SeaOrmStorage::new` already runs the migrations
pub async fn run_migrate() -> Result<()> {
    let storage = StorageFactory::create()
        .await
        .context("Failed to run migrations")?;
    info!("Migrations applied on {} backend", storage.backend_name());
    storage.get_db().clone().close().await?;
    println!("Migrations applied.");
    Ok(())
}

fn read_password(stdin: bool) -> Result<String> {
    if stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        return Ok(line.trim().to_string());
    }

    print!("Enter admin password: ");
    io::stdout().flush()?;
    let password = rpassword::read_password().context("Failed to read password")?;

    print!("Confirm password: ");
    io::stdout().flush()?;
    let confirm = rpassword::read_password().context("Failed to read password")?;

    if password != confirm {
        bail!("Passwords do not match");
    }
    Ok(password)
}

/// Print an Argon2 hash to paste into `api.admin_password`
pub fn run_hash_password(stdin: bool) -> Result<()> {
    let password = read_password(stdin)?;
    if password.len() < 8 {
        bail!("Password must be at least 8 characters long");
    }
    let hashed = hash_password(&password).map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("{}", hashed);
    Ok(())
}
