//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod validation;

use crate::auth::JwtTokenValidator;
use crate::services::ingest::IngestionEngine;
use crate::state::AppState;
use anyhow::{Context, Result};
use imagems_core::Config;
use imagems_db::ImageMetaRepository;
use imagems_storage::LocalFileWriter;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_json)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;

    let engine = IngestionEngine::new(
        &config,
        Arc::new(JwtTokenValidator::new(&config.jwt_secret)),
        Arc::new(ImageMetaRepository::new(pool)),
        Arc::new(LocalFileWriter::new()),
    )
    .await
    .context("Failed to initialize ingestion engine")?;

    let state = Arc::new(AppState::new(config.clone(), engine));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
