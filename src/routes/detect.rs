use axum::{
    extract::{Query, State},
    Json,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::detector::Detection;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub code: String,
    /// Accepts both "file_name" and "fileName" from the client
    #[serde(default, alias = "fileName")]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchDetectRequest {
    pub items: Vec<DetectRequest>,
}

#[derive(Debug, Serialize)]
pub struct BatchDetectResponse {
    pub results: Vec<Detection>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    #[serde(alias = "fileName")]
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub file_name: String,
    pub language: Option<String>,
    pub name: Option<String>,
}

/// Reject code payloads over the configured limit.
pub fn check_input_size(code: &str, max_input_bytes: usize) -> AppResult<()> {
    if code.len() > max_input_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "Code is {} bytes. Maximum allowed is {}.",
            code.len(),
            max_input_bytes,
        )));
    }
    Ok(())
}

pub async fn detect(
    State(state): State<AppState>,
    Json(req): Json<DetectRequest>,
) -> AppResult<Json<Detection>> {
    check_input_size(&req.code, state.config.max_input_bytes)?;
    let detection = state.detector.detect(&req.code, req.file_name.as_deref());
    Ok(Json(detection))
}

/// Detect many snippets at once. Results keep the request order.
pub async fn detect_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchDetectRequest>,
) -> AppResult<Json<BatchDetectResponse>> {
    if req.items.len() > state.config.max_batch_items {
        return Err(AppError::BadRequest(format!(
            "Batch has {} items. Maximum allowed is {}.",
            req.items.len(),
            state.config.max_batch_items,
        )));
    }
    for item in &req.items {
        check_input_size(&item.code, state.config.max_input_bytes)?;
    }

    let detector = state.detector.clone();
    let count = req.items.len();
    let results = tokio::task::spawn_blocking(move || {
        req.items
            .par_iter()
            .map(|item| detector.detect(&item.code, item.file_name.as_deref()))
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Batch detection task failed: {}", e)))?;

    tracing::debug!(items = count, "Batch detection complete");
    Ok(Json(BatchDetectResponse { results }))
}

pub async fn resolve(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Json<ResolveResponse> {
    let catalog = state.detector.catalog();
    let language = catalog.resolve(&query.file_name);
    let name = language.map(|id| catalog.name_or_id(id).to_string());

    Json(ResolveResponse {
        language: language.map(str::to_string),
        name,
        file_name: query.file_name,
    })
}
