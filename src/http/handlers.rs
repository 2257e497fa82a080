//! Request handlers.
//!
//! - `ANY /` and `ANY /{*path}`: run one call tree, answer `hello`
//! - `GET /traces`: summaries of retained call trees
//! - `GET /traces/{correlation_id}`: span records of one call tree
//! - `GET /health`: liveness

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::http::request::{request_id, X_CORRELATION_ID};
use crate::http::server::AppState;
use crate::observability::span::CorrelationId;

/// Run the request's call tree. Always answers 200, failures live in the trace.
pub async fn call_tree_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = request_id(&headers);
    let report = state.call_tree.handle(&request_id).await;

    let mut response = report.body.into_response();
    match HeaderValue::from_str(&report.correlation_id.to_string()) {
        Ok(value) => {
            response.headers_mut().insert(X_CORRELATION_ID, value);
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Correlation id is not a valid header");
        }
    }
    response
}

pub async fn list_traces(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.collector.summaries())
}

pub async fn get_trace(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id: CorrelationId = match id.parse() {
        Ok(id) => id,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid correlation id").into_response(),
    };

    match state.collector.trace(&correlation_id) {
        Some(records) => Json(records).into_response(),
        None => (StatusCode::NOT_FOUND, "Unknown correlation id").into_response(),
    }
}

pub async fn health() -> &'static str {
    "ok"
}
