//! POST /assess
//!
//! Detect beans in an uploaded image, tally and grade the detections, and
//! keep the annotated result as a scratch record until it is saved.

use std::num::IntErrorKind;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use caqao_common::db::detections::insert_scratch;
use caqao_common::db::{NewAssessment, ANNOTATED_IMAGE_MIMETYPE};
use caqao_common::grading::{grade, DetectionTally, GradeCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::annotate;
use crate::detector::cap_detections;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Multipart field carrying the image file
pub const IMAGE_FIELD: &str = "image";
/// Multipart field carrying the measured bean size
pub const BEAN_SIZE_FIELD: &str = "beanSize";

const FALLBACK_UPLOAD_MIMETYPE: &str = "application/octet-stream";

/// Assessment result returned to the client
#[derive(Debug, Serialize)]
pub struct AssessResponse {
    /// Scratch record id
    pub id: i64,
    pub img_src_url: String,
    #[serde(flatten)]
    pub tally: DetectionTally,
    #[serde(rename = "beanGrade")]
    pub bean_grade: GradeCode,
}

struct Upload {
    image: Bytes,
    mimetype: String,
    bean_size: i64,
}

pub async fn assess(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AssessResponse>> {
    let multipart =
        multipart.map_err(|e| ApiError::BadRequest(format!("Expected multipart form: {}", e)))?;
    let upload = read_upload(multipart).await?;

    // Reject undecodable uploads before spending an inference call on them
    let decode_input = upload.image.clone();
    let canvas = tokio::task::spawn_blocking(move || annotate::decode(&decode_input))
        .await
        .map_err(|e| ApiError::Internal(format!("Decode task failed: {}", e)))??;

    let detections = state
        .detector
        .detect(&upload.image, &upload.mimetype)
        .await?;
    let max_det = state.settings.max_det;
    let detections = cap_detections(detections, max_det);
    debug!(
        detector = state.detector.name(),
        count = detections.len(),
        "Detections received"
    );

    let tally = DetectionTally::from_labels(detections.iter().map(|d| d.label.as_str()))?;
    let bean_grade = grade(&tally, upload.bean_size, max_det);

    let annotated = tokio::task::spawn_blocking(move || annotate::render(canvas, &detections))
        .await
        .map_err(|e| ApiError::Internal(format!("Annotate task failed: {}", e)))??;

    let created_at = Utc::now();
    let filename = record_filename(created_at);
    let id = insert_scratch(
        &state.db,
        &NewAssessment {
            image: annotated,
            mimetype: ANNOTATED_IMAGE_MIMETYPE.to_string(),
            filename: filename.clone(),
            tally,
            grade: bean_grade,
            created_at,
        },
    )
    .await?;

    info!(
        id,
        filename = %filename,
        grade = %bean_grade,
        beans = tally.total(),
        "Assessment stored as scratch record"
    );

    Ok(Json(AssessResponse {
        id,
        img_src_url: state.settings.image_urls.image_url(&filename),
        tally,
        bean_grade,
    }))
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    let mut image: Option<(Bytes, String)> = None;
    let mut bean_size: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(IMAGE_FIELD) => {
                let mimetype = field
                    .content_type()
                    .unwrap_or(FALLBACK_UPLOAD_MIMETYPE)
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image: {}", e)))?;
                image = Some((data, mimetype));
            }
            Some(BEAN_SIZE_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read beanSize: {}", e)))?;
                bean_size = Some(text);
            }
            _ => {}
        }
    }

    let (image, mimetype) = image
        .filter(|(data, _)| !data.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing image file".to_string()))?;
    let bean_size = parse_bean_size(bean_size.as_deref())?;

    Ok(Upload {
        image,
        mimetype,
        bean_size,
    })
}

/// Integers beyond `i64` saturate; grading only compares against small bounds
fn parse_bean_size(raw: Option<&str>) -> ApiResult<i64> {
    let raw = raw.ok_or_else(|| ApiError::BadRequest("Missing beanSize".to_string()))?;
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let invalid =
        || ApiError::BadRequest(format!("beanSize must be an integer, got {:?}", raw));

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    match trimmed.parse::<i64>() {
        Ok(size) => Ok(size),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(invalid()),
        },
    }
}

/// Record filename from the assessment timestamp, unique to the microsecond
pub fn record_filename(created_at: DateTime<Utc>) -> String {
    created_at.format("%Y-%m-%d_%H-%M-%S-%6f.jpg").to_string()
}
