use axum::extract::{Path, State};

use crate::app::AppState;
use crate::error::ApiError;

/// DELETE /notes/:id - Delete a note
///
/// Responds with the id from the path as a plain-text body.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    state
        .notes
        .delete(&id)
        .await
        .map_err(|e| e.or_not_found(ApiError::not_found("resource not found to delete")))?;
    Ok(id)
}
