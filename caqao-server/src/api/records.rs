//! Saved assessment records and their images

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use caqao_common::db::detections::{self, find_image, promote_scratch};
use caqao_common::db::RecordSummary;
use caqao_common::Error;
use serde::Deserialize;
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

/// Body of a successful save
pub const SAVED_TEXT: &str = "Assessment Results Saved";

/// Optional selectors for POST /save_results
#[derive(Debug, Default, Deserialize)]
pub struct SaveQuery {
    /// Promote this scratch record instead of the most recent one
    pub scratch_id: Option<i64>,
    /// Owner of the saved record
    pub user_id: Option<i64>,
}

/// POST /save_results
///
/// Promotes the pending assessment and discards every other scratch record.
pub async fn save_results(
    State(state): State<AppState>,
    Query(query): Query<SaveQuery>,
) -> ApiResult<&'static str> {
    let record = promote_scratch(&state.db, query.scratch_id, query.user_id).await?;
    info!(id = record.id, filename = %record.filename, "Assessment saved");
    Ok(SAVED_TEXT)
}

/// GET /detections
///
/// Saved records in id order, each with the absolute URL of its image.
pub async fn list_detections(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RecordSummary>>> {
    let summaries = detections::list_detections(&state.db)
        .await?
        .into_iter()
        .map(|summary| RecordSummary {
            filename: state.settings.image_urls.image_url(&summary.filename),
            ..summary
        })
        .collect();
    Ok(Json(summaries))
}

/// GET /detections/:filename
///
/// Saved images are served first; a pending scratch image is served when no
/// saved record has that filename.
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let stored = find_image(&state.db, &filename)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No image named {}", filename)))?;

    let disposition = format!("inline; filename=\"{}\"", stored.filename);
    Ok((
        [
            (header::CONTENT_TYPE, stored.mimetype),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        stored.image,
    )
        .into_response())
}
