use axum::{extract::State, Json};

use crate::app::AppState;
use crate::database::Note;
use crate::error::ApiError;

/// GET /notes - List every note, in whatever order storage returns them
pub async fn get(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.notes.list().await?;
    Ok(Json(notes))
}
