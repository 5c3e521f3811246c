//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/token wiring and the user operations
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: response bodies
//! - `errors.rs`: consistent error responses

use std::any::Any;
use std::sync::Arc;

use axum::{
    Extension, Router, extract::DefaultBodyLimit, http::StatusCode, response::Response,
    routing::get,
};
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use gatekeeper_auth::{StoreError, TokenError};

use crate::config::{ApiConfig, ConfigError};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("token codec: {0}")]
    Token(#[from] TokenError),

    #[error("user store: {0}")]
    Store(#[from] StoreError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> Result<Router, StartupError> {
    let services = services::build_services(config).await?;
    Ok(router(Arc::new(services)))
}

/// Router over already-built services; tests use this to inject stores.
pub fn router(services: Arc<AppServices>) -> Router {
    let api = routes::router(services.auth_state());

    Router::new()
        .route(
            "/health",
            get(routes::system::health).fallback(routes::system::not_found),
        )
        .nest("/api", api)
        .fallback(routes::system::not_found)
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = %detail, "handler panicked");

    errors::json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        errors::INTERNAL_ERROR_MESSAGE,
    )
}
