use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised while building a detector from configuration.
///
/// Detection itself never fails; these only surface when a catalog overlay or
/// a custom signal list is loaded.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Invalid signal pattern for {language}: {source}")]
    InvalidPattern {
        language: String,
        #[source]
        source: regex::Error,
    },

    #[error("Signal for {0} must have a positive weight")]
    ZeroWeight(String),

    #[error("Invalid language identifier: {0:?}")]
    InvalidLanguageId(String),

    #[error("Cannot read catalog overlay {path}: {source}")]
    OverlayIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog overlay {path}: {source}")]
    OverlayFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Detector error: {0}")]
    Detector(#[from] DetectError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            AppError::Detector(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
