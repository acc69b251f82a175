use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use crate::app::AppState;
use crate::database::NoteDraft;
use crate::error::ApiError;

/// Body of a successful create: the request payload as received, plus the
/// id storage generated
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNote {
    pub note: Value,
    pub insert_id: u64,
}

/// POST /notes - Create a note
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CreatedNote>, ApiError> {
    let Json(note) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    tracing::info!("Create note request start.");

    let draft = NoteDraft::from_payload(&note);
    let insert_id = state.notes.create(&draft).await?;

    Ok(Json(CreatedNote { note, insert_id }))
}
