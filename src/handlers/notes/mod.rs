pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use axum::{routing::get as get_route, Router};

use crate::app::AppState;

// Re-export handler functions for use in routing
pub use create::post as note_post;
pub use delete::delete as note_delete;
pub use get::get as note_get;
pub use list::get as notes_get;
pub use update::put as note_put;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Collection
        .route("/notes", get_route(notes_get).post(note_post))
        // Single note
        .route(
            "/notes/:id",
            get_route(note_get).put(note_put).delete(note_delete),
        )
}
