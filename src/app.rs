use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::config::ApiConfig;
use crate::database::NotePool;
use crate::handlers;
use crate::middleware::with_request_logging;
use crate::services::NoteService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub notes: NoteService,
}

impl AppState {
    pub fn new(pool: Arc<dyn NotePool>) -> Self {
        Self {
            notes: NoteService::new(pool),
        }
    }
}

pub fn app(state: AppState, api: &ApiConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(handlers::notes::routes())
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes))
        .with_state(state);

    // Global middleware
    if api.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if api.enable_request_logging {
        router = with_request_logging(router);
    }
    router
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Notes API",
        "version": version,
        "endpoints": {
            "health": "GET /health",
            "notes": "GET, POST /notes",
            "note": "GET, PUT, DELETE /notes/:id",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.notes.pool().ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
