//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use ledger::{DefaultChainStore, MetricsRegistry, SharedLedger};

/// Shared state held by the request handlers.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// The ledger; every handler goes through its single lock.
    pub ledger: SharedLedger<DefaultChainStore>,
    /// Metrics registry shared between the ledger and `/metrics`.
    pub metrics: Option<MetricsRegistry>,
    /// Deadline for one submit-and-commit.
    pub commit_timeout: Duration,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;

#[cfg(test)]
pub fn test_state(dir: &std::path::Path) -> SharedState {
    test_state_with(dir, 1, Duration::from_secs(30))
}

/// Ledger under `dir` at `difficulty`. An existing chain file is reused,
/// so a high difficulty only applies to blocks mined after genesis.
#[cfg(test)]
pub fn test_state_with(dir: &std::path::Path, difficulty: u32, commit_timeout: Duration) -> SharedState {
    let mut cfg = ledger::LedgerConfig::default();
    cfg.mining.difficulty = ledger::Difficulty::new(difficulty).unwrap();
    cfg.storage.path = dir.join("blockchain_data.json");
    let metrics = MetricsRegistry::new().unwrap();
    let ledger = ledger::open_default(&cfg, Some(&metrics)).unwrap();

    Arc::new(AppState {
        ledger: SharedLedger::new(ledger),
        metrics: Some(metrics),
        commit_timeout,
    })
}
