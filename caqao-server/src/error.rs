//! Error types for caqao-server
//!
//! Every failure reaches the client as a JSON body
//! `{"error": {"code": ..., "message": ...}}` with a matching status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::annotate::AnnotateError;
use crate::detector::DetectorError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Domain, storage and configuration errors from caqao-common
    #[error(transparent)]
    Common(#[from] caqao_common::Error),

    /// External detector unreachable or returned garbage (502)
    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<AnnotateError> for ApiError {
    fn from(err: AnnotateError) -> Self {
        match err {
            AnnotateError::Decode(e) => {
                ApiError::BadRequest(format!("Unreadable image: {}", e))
            }
            AnnotateError::Encode(e) => {
                ApiError::Internal(format!("Failed to encode annotated image: {}", e))
            }
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        use caqao_common::Error as E;

        match self {
            ApiError::Common(err) => match err {
                E::MalformedLabel(_) => (StatusCode::UNPROCESSABLE_ENTITY, "MALFORMED_LABEL"),
                E::UnknownCategory { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "UNKNOWN_CATEGORY")
                }
                E::NoScratchRecord => (StatusCode::CONFLICT, "NO_SCRATCH_RECORD"),
                E::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                E::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                E::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
                E::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
                E::Config(_) | E::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::Detector(_) => (StatusCode::BAD_GATEWAY, "DETECTOR_ERROR"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!("{} ({})", message, error_code);
        } else {
            warn!("{} ({})", message, error_code);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_client_statuses() {
        let cases: Vec<(ApiError, StatusCode, &str)> = vec![
            (
                caqao_common::Error::MalformedLabel("-".into()).into(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "MALFORMED_LABEL",
            ),
            (
                caqao_common::Error::UnknownCategory {
                    label: "rotten".into(),
                    key: "rotten".into(),
                }
                .into(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNKNOWN_CATEGORY",
            ),
            (
                caqao_common::Error::NoScratchRecord.into(),
                StatusCode::CONFLICT,
                "NO_SCRATCH_RECORD",
            ),
            (
                caqao_common::Error::NotFound("x.jpg".into()).into(),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                ApiError::BadRequest("beanSize".into()),
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
            ),
            (
                DetectorError::Status(503, "busy".into()).into(),
                StatusCode::BAD_GATEWAY,
                "DETECTOR_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }
}
