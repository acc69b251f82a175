// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::StoreError;

/// HTTP API error. The 404 variants keep each endpoint's own body shape.
#[derive(Debug)]
pub enum ApiError {
    // 404 with `{statusCode, statusMessage, data: null}`
    NotFoundEnvelope(&'static str),

    // 404 with `{statusMessage}` only
    NotFound(&'static str),

    // 400, request body is not JSON
    InvalidJson(String),

    // 500, anything from the pool or the driver
    Storage(StoreError),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFoundEnvelope(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::NotFoundEnvelope(message) => json!({
                "statusCode": 404,
                "statusMessage": message,
                "data": null,
            }),
            ApiError::NotFound(message) => json!({ "statusMessage": message }),
            ApiError::InvalidJson(message) => json!({ "error": { "message": message } }),
            ApiError::Storage(err) => json!({ "error": err.to_json() }),
        }
    }
}

impl ApiError {
    pub fn resource_not_found() -> Self {
        ApiError::NotFoundEnvelope("resource not found")
    }

    pub fn not_found(message: &'static str) -> Self {
        ApiError::NotFound(message)
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Storage(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFoundEnvelope(message) | ApiError::NotFound(message) => {
                write!(f, "{}", message)
            }
            ApiError::InvalidJson(message) => write!(f, "invalid JSON body: {}", message),
            ApiError::Storage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let ApiError::Storage(err) = &self {
            tracing::error!("Storage error: {}", err);
        }
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
