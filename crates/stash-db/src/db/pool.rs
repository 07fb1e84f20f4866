//! Database connection setup

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use stash_core::DatabaseSettings;
use std::time::Duration;

/// Open a Postgres connection pool from the configured settings.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool> {
    let url = settings
        .url
        .as_deref()
        .context("DATABASE_URL is not configured")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = settings.max_connections,
        "Database connected successfully"
    );

    Ok(pool)
}
