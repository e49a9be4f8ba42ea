use axum::{extract::State, Json};

use crate::lang::LanguageEntry;
use crate::state::AppState;

/// Every language the detector can report, in catalog order.
pub async fn list_languages(State(state): State<AppState>) -> Json<Vec<LanguageEntry>> {
    Json(state.detector.catalog().entries().to_vec())
}
