use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::state::SharedState;

/// `GET /metrics`
///
/// Prometheus text exposition of the ledger metrics, or 404 when metrics
/// are disabled.
pub async fn metrics(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.metrics {
        Some(registry) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            registry.gather_text(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            "metrics disabled\n".to_string(),
        ),
    }
}
