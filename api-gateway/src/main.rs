// api-gateway/src/main.rs

//! API gateway binary.
//!
//! This binary exposes a small HTTP API on top of the `ledger` crate:
//!
//! - `POST /api/submit-complaint`
//! - `GET /api/complaints`
//! - `GET /api/blockchain-info`
//! - `GET /health`
//! - `GET /metrics`
//!
//! It embeds a JSON-file-backed ledger behind a single lock. Each submission
//! is staged and mined into its own block before the response is sent.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::Response,
    routing::{get, post},
};
use tokio::signal;

use config::ApiConfig;
use ledger::{LedgerConfig, MetricsRegistry, SharedLedger};
use routes::{chain, complaints, health, metrics};
use state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api_gateway=info,ledger=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let api_cfg = ApiConfig::from_env().map_err(|e| format!("invalid API configuration: {e}"))?;
    let ledger_cfg =
        LedgerConfig::from_env().map_err(|e| format!("invalid ledger configuration: {e}"))?;

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = if ledger_cfg.metrics.enabled {
        Some(
            MetricsRegistry::new()
                .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
        )
    } else {
        None
    };

    // ---------------------------
    // Ledger (may mine a genesis block)
    // ---------------------------

    let ledger = {
        let cfg = ledger_cfg.clone();
        let metrics = metrics.clone();
        tokio::task::spawn_blocking(move || ledger::open_default(&cfg, metrics.as_ref()))
            .await
            .map_err(|e| format!("ledger startup task failed: {e}"))?
            .map_err(|e| {
                format!(
                    "failed to open ledger at {}: {e}",
                    ledger_cfg.storage.path.display()
                )
            })?
    };

    let summary = ledger.chain_summary();
    tracing::info!(
        blocks = summary.total_blocks,
        tip = %summary.last_block_hash,
        difficulty = %summary.difficulty,
        valid = summary.is_valid,
        "ledger ready"
    );

    // ---------------------------
    // Shared state
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState {
        ledger: SharedLedger::new(ledger),
        metrics,
        commit_timeout: api_cfg.commit_timeout,
    });

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = router(app_state);

    tracing::info!("API gateway listening on http://{}", api_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    Ok(())
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/api/submit-complaint",
            post(complaints::submit_complaint).options(preflight),
        )
        .route("/api/complaints", get(complaints::list_complaints))
        .route("/api/blockchain-info", get(chain::blockchain_info))
        .route("/health", get(health::health))
        .route("/metrics", get(metrics::metrics))
        .layer(middleware::map_response(allow_any_origin))
        .with_state(state)
}

/// Answers CORS preflight requests.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Adds permissive CORS headers to every response.
async fn allow_any_origin(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    response
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cors_headers_are_added() {
        let response = allow_any_origin(Response::new(axum::body::Body::empty())).await;

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .unwrap()
                .to_str()
                .unwrap()
                .contains("POST")
        );
    }

    #[tokio::test]
    async fn preflight_is_no_content() {
        assert_eq!(preflight().await, StatusCode::NO_CONTENT);
    }
}
