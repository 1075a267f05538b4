//! Evidence ledger library crate.
//!
//! This crate provides a tamper-evident, append-only ledger for complaint
//! evidence: submissions are staged, batched into blocks, sealed with a
//! SHA-256 proof-of-work and persisted as one JSON document. It contains:
//!
//! - strongly-typed domain types and the canonical encoding (`types`),
//! - mining, verification and the ledger itself (`chain`),
//! - storage backends (`storage`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level configuration (`config`).
//!
//! Higher-level binaries (the HTTP gateway, the `ledger` inspection CLI)
//! compose these pieces.

pub mod chain;
pub mod config;
pub mod metrics;
pub mod storage;
pub mod types;

// Re-export top-level configuration types.
pub use config::{ConfigError, LedgerConfig, MetricsConfig};

// Re-export "core" chain types and traits.
pub use chain::{
    CancelToken, ChainFault, ChainStore, ChainSummary, Ledger, LedgerError, MalformedBlockError,
    Miner, MiningConfig, MiningError, RecoveryConfig, RecoveryPolicy, SharedLedger, Submitted,
    verify_chain,
};

// Re-export storage backends.
pub use storage::{InMemoryChainStore, JsonFileStore, JsonStoreConfig, StorageError};

// Re-export metrics registry and ledger metrics.
pub use metrics::{LedgerMetrics, MetricsRegistry};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Type alias for the default chain store backend.
pub type DefaultChainStore = JsonFileStore;

/// Ledger persisted through the default JSON document store.
pub type DefaultLedger = Ledger<DefaultChainStore>;

/// Opens the default ledger described by `cfg`, wiring in `metrics` when
/// metrics are enabled.
pub fn open_default(
    cfg: &LedgerConfig,
    metrics: Option<&MetricsRegistry>,
) -> Result<DefaultLedger, LedgerError> {
    let store = JsonFileStore::new(&cfg.storage);
    let metrics = metrics
        .filter(|_| cfg.metrics.enabled)
        .map(|registry| registry.ledger.clone());
    Ledger::open_with_metrics(cfg, store, metrics)
}
