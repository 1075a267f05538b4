//! Prometheus-backed ledger metrics.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed ledger metrics. Exposition over
//! HTTP is left to the embedding binary, which serves
//! [`MetricsRegistry::gather_text`] on whatever route it likes.

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};
use tracing::warn;

/// Ledger-related Prometheus metrics.
///
/// These are registered into a [`Registry`] and updated by
/// [`crate::Ledger`] as it stages, mines and persists.
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Transactions accepted into the pending queue.
    pub transactions_staged: IntCounter,
    /// Blocks mined and durably persisted.
    pub blocks_committed: IntCounter,
    /// Commits that failed in mining or persistence.
    pub commit_failures: IntCounter,
    /// Times an unreadable or corrupt stored chain was replaced.
    pub chain_recoveries: IntCounter,
    /// Current number of blocks, genesis included.
    pub chain_height: IntGauge,
    /// Current length of the pending queue.
    pub pending_transactions: IntGauge,
    /// Wall-clock time of a successful commit (mine + persist), in seconds.
    pub mining_seconds: Histogram,
    /// Hashing attempts needed per committed block.
    pub mining_hashes: Histogram,
}

impl LedgerMetrics {
    /// Registers ledger metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let transactions_staged = IntCounter::with_opts(Opts::new(
            "transactions_staged_total",
            "Total number of evidence transactions staged",
        ))?;
        registry.register(Box::new(transactions_staged.clone()))?;

        let blocks_committed = IntCounter::with_opts(Opts::new(
            "blocks_committed_total",
            "Total number of blocks mined and persisted",
        ))?;
        registry.register(Box::new(blocks_committed.clone()))?;

        let commit_failures = IntCounter::with_opts(Opts::new(
            "commit_failures_total",
            "Total number of commits aborted by mining or persistence failures",
        ))?;
        registry.register(Box::new(commit_failures.clone()))?;

        let chain_recoveries = IntCounter::with_opts(Opts::new(
            "chain_recoveries_total",
            "Total number of times the stored chain was discarded and regenerated",
        ))?;
        registry.register(Box::new(chain_recoveries.clone()))?;

        let chain_height = IntGauge::with_opts(Opts::new(
            "chain_height",
            "Number of blocks in the chain, genesis included",
        ))?;
        registry.register(Box::new(chain_height.clone()))?;

        let pending_transactions = IntGauge::with_opts(Opts::new(
            "pending_transactions",
            "Number of staged transactions awaiting a block",
        ))?;
        registry.register(Box::new(pending_transactions.clone()))?;

        let mining_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "mining_seconds",
                "Time to mine and persist a block in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
        )?;
        registry.register(Box::new(mining_seconds.clone()))?;

        let mining_hashes = Histogram::with_opts(
            HistogramOpts::new(
                "mining_hashes",
                "Hashing attempts needed to find a valid nonce",
            )
            .buckets(prometheus::exponential_buckets(16.0, 4.0, 10)?),
        )?;
        registry.register(Box::new(mining_hashes.clone()))?;

        Ok(Self {
            transactions_staged,
            blocks_committed,
            commit_failures,
            chain_recoveries,
            chain_height,
            pending_transactions,
            mining_seconds,
            mining_hashes,
        })
    }
}

/// Wrapper around a Prometheus registry and the ledger metrics.
///
/// This is the main handle you pass around in a service. It is cheap to
/// clone and can be shared across threads/tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub ledger: LedgerMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// (namespace `ledger`) and registers the ledger metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ledger".to_string()), None)?;
        let ledger = LedgerMetrics::register(&registry)?;
        Ok(Self { registry, ledger })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
