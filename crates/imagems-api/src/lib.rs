//! imagems API Library
//!
//! HTTP handlers, middleware, the ingestion engine and application setup.

mod handlers;
pub mod middleware;
mod telemetry;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

// Re-exports
pub use error::ErrorResponse;
pub use services::ingest::{IngestResult, IngestionEngine};
pub use state::AppState;
