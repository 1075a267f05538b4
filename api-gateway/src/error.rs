//! Error type returned by the HTTP handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use ledger::{LedgerError, MiningError};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is unusable.
    #[error("{0}")]
    BadRequest(String),

    /// Mining did not finish before the commit deadline. The submission
    /// was not recorded and may be retried.
    #[error("commit deadline exceeded; the complaint was not recorded")]
    CommitTimedOut,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A blocking ledger task panicked or was aborted.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::CommitTimedOut => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Ledger(LedgerError::Mining(
                MiningError::Cancelled | MiningError::DeadlineExceeded { .. },
            )) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Ledger(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
