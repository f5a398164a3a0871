//! Metadata store connection

use anyhow::{Context, Result};
use imagems_core::Config;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// `image_meta` schema, compiled into the binary.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Open the metadata pool and bring the `image_meta` schema up to date.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    let pool = connect_pool(config).await?;
    apply_schema(&pool).await?;
    Ok(pool)
}

async fn connect_pool(config: &Config) -> Result<PgPool> {
    let acquire_timeout = Duration::from_secs(config.db_timeout_seconds);

    // A stale connection is replaced on checkout instead of failing an upload.
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(acquire_timeout)
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await
        .with_context(|| {
            format!(
                "metadata store unreachable (timeout {}s)",
                config.db_timeout_seconds
            )
        })?;

    tracing::info!(
        max_connections = config.db_max_connections,
        acquire_timeout_secs = config.db_timeout_seconds,
        "Metadata store pool ready"
    );
    Ok(pool)
}

async fn apply_schema(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("image_meta schema migration failed")?;
    tracing::info!(migrations = MIGRATOR.iter().count(), "image_meta schema up to date");
    Ok(())
}
