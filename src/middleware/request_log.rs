//! Per-request logging.
//!
//! Every request gets an `x-request-id` (generated unless the client sent
//! one) and a `request` span carrying it. Anything a handler logs lands in
//! that span, so the span is the request's log handle.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderValue, Request, Response};
use axum::Router;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use tracing::Span;
use uuid::Uuid;

/// Generates v4 UUID request ids
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// Wrap `router` with request-id assignment and the trace layer
pub fn with_request_logging(router: Router) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(request_span)
        .on_request(|_request: &Request<Body>, _span: &Span| {
            tracing::info!(received_at = %chrono::Utc::now().to_rfc3339(), "request received");
        })
        .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
            tracing::info!(
                status = response.status().as_u16(),
                latency_ms = latency.as_millis() as u64,
                "response sent"
            );
        })
        .on_failure(|class: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
            tracing::warn!(
                latency_ms = latency.as_millis() as u64,
                "request failed: {}",
                class
            );
        });

    // Last layer added runs first: the id is set before the span is made.
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(trace)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
