use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use shared_config::AppConfig;

pub type DbPool = SqlitePool;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the connection pool described by the configuration, creating the
/// database file when it does not exist yet.
pub async fn connect(config: &AppConfig) -> Result<DbPool> {
    debug!("Connecting to database at {}", config.db_url);

    let options = SqliteConnectOptions::from_str(&config.db_url)
        .with_context(|| format!("Invalid DB_URL: {}", config.db_url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    info!("Database pool ready ({} max connections)", config.db_max_connections.max(1));
    Ok(pool)
}

/// Single-connection in-memory pool. Every connection to `sqlite::memory:`
/// is a distinct database, so the pool must never open a second one.
pub async fn connect_in_memory() -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("Failed to open in-memory database")?;

    Ok(pool)
}
