//! caqao-server library interface
//!
//! Cacao bean cut-test assessment over HTTP: upload an image, get a tally
//! and grade back, then save the result.

pub mod annotate;
pub mod api;
pub mod detector;
pub mod error;
pub mod public_url;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::detector::Detector;
use crate::public_url::ImageUrls;

/// Per-deployment assessment settings
#[derive(Debug, Clone)]
pub struct AssessmentSettings {
    /// Detection cap; also the denominator of the defect threshold
    pub max_det: u32,
    pub image_urls: ImageUrls,
    pub max_upload_bytes: usize,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub detector: Arc<dyn Detector>,
    pub settings: Arc<AssessmentSettings>,
}

impl AppState {
    pub fn new(db: SqlitePool, detector: Arc<dyn Detector>, settings: AssessmentSettings) -> Self {
        Self {
            db,
            detector,
            settings: Arc::new(settings),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let max_upload_bytes = state.settings.max_upload_bytes;

    Router::new()
        .route("/assess", post(api::assess))
        .route("/save_results", post(api::save_results))
        .route("/detections", get(api::list_detections))
        .route("/detections/:filename", get(api::get_image))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
