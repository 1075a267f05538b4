use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::SharedState;

/// Simple health-check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// `None` while a commit holds the ledger lock.
    pub blocks: Option<usize>,
}

/// `GET /health`
///
/// Returns a basic JSON document indicating liveness. Never waits on the
/// ledger: if a block is being mined the height is simply omitted.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let blocks = state.ledger.try_height();
    (StatusCode::OK, Json(HealthResponse { status: "ok", blocks }))
}
