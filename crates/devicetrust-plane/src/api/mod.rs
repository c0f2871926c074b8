//! API module for the device trust plane

pub mod error;
pub mod handlers;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use handlers::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub device_count: usize,
    pub canonicalization: String,
    pub duplicate_policy: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Readiness check endpoint
///
/// GET /ready
pub async fn ready(State(state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    let (ready, device_count) = match state.registrar.device_count().await {
        Ok(count) => (true, count),
        Err(e) => {
            error!(error = %e, "Device store unavailable");
            (false, 0)
        }
    };

    Json(ReadyResponse {
        ready,
        device_count,
        canonicalization: state.verifier.policy().to_string(),
        duplicate_policy: state.registrar.duplicate_policy().to_string(),
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Device endpoints
        .route("/registerDevice", post(handlers::register_device))
        .route("/submitIntentProof", post(handlers::submit_intent_proof))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
