use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::database::NoteDraft;
use crate::error::ApiError;

/// PUT /notes/:id - Replace a note's title and body
///
/// Responds with the request payload, not the stored row.
pub async fn put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(item) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let draft = NoteDraft::from_payload(&item);
    state
        .notes
        .update(&id, &draft)
        .await
        .map_err(|e| e.or_not_found(ApiError::not_found("resource not found")))?;

    Ok(Json(item))
}
