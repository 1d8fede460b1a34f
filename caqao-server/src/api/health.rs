//! Liveness and health endpoints

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Body of `GET /`
pub const INDEX_TEXT: &str = "CAQAO Server";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
}

/// GET /
pub async fn serve_index() -> &'static str {
    INDEX_TEXT
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "caqao-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(serve_index))
        .route("/health", get(health_check))
}
