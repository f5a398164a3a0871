//! Route configuration and setup

use crate::auth::{api_key_middleware, ApiKeyState};
use crate::handlers;
use crate::middleware::request_id_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, put},
    Router,
};
use imagems_core::{constants, Config};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Setup all application routes.
///
/// Everything lives under the web root (`/v0/imagems`): the API routes and,
/// as the nested fallback, the static image tree. When a master API key is
/// configured it guards both.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let images = ServeDir::new(&config.images_dir)
        .not_found_service(handlers::not_found.into_service());

    let mut web_root = Router::new()
        .route("/status", get(handlers::status::status))
        .route("/upload", put(handlers::upload::upload_image))
        .route("/upload/base64", put(handlers::upload::upload_base64_image))
        .fallback_service(images);

    if let Some(master_api_key) = &config.master_api_key {
        let api_key_state = Arc::new(ApiKeyState {
            master_api_key: master_api_key.clone(),
        });
        web_root = web_root.layer(axum::middleware::from_fn_with_state(
            api_key_state,
            api_key_middleware,
        ));
    } else {
        tracing::warn!("MASTER_API_KEY not set - routes are not gated by x-api-key");
    }

    let web_root = web_root.with_state(state);

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = Router::new()
        .nest(&constants::web_root_url(), web_root)
        .fallback(handlers::not_found)
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit))
        .layer(DefaultBodyLimit::max(config.max_upload_size_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware));

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::OPTIONS,
    ];
    let headers = [
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        HeaderName::from_static(crate::auth::middleware::API_KEY_HEADER),
    ];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {:?}: {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
    };
    Ok(cors)
}
