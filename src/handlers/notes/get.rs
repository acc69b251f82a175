use axum::{
    extract::{Path, State},
    Json,
};

use crate::app::AppState;
use crate::database::Note;
use crate::error::ApiError;

/// GET /notes/:id - Fetch a single note
///
/// The id is passed to storage as-is; a value that matches no row
/// (including a non-numeric one) is a 404.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .notes
        .get(&id)
        .await
        .map_err(|e| e.or_not_found(ApiError::resource_not_found()))?;
    Ok(Json(note))
}
