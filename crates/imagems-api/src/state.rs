//! Application state shared by all handlers.

use crate::services::ingest::IngestionEngine;
use imagems_core::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<IngestionEngine>,
}

impl AppState {
    pub fn new(config: Config, engine: IngestionEngine) -> Self {
        Self {
            config,
            engine: Arc::new(engine),
        }
    }
}
