use axum::{Json, extract::State};
use serde::Serialize;

use ledger::ChainSummary;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct BlockchainInfoResponse {
    pub success: bool,
    pub blockchain: ChainSummary,
}

/// `GET /api/blockchain-info`
///
/// Block count, tip hash, difficulty and the result of a full
/// re-verification of the chain.
pub async fn blockchain_info(
    State(state): State<SharedState>,
) -> Result<Json<BlockchainInfoResponse>, ApiError> {
    let ledger = state.ledger.clone();
    let blockchain = tokio::task::spawn_blocking(move || ledger.summary()).await??;

    Ok(Json(BlockchainInfoResponse {
        success: true,
        blockchain,
    }))
}
