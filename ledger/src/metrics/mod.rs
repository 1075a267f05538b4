//! Metrics and instrumentation for the ledger.
//!
//! This module defines Prometheus-compatible metrics for staging, mining
//! and persistence. Typical usage in a service:
//!
//! ```ignore
//! use ledger::metrics::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new()?;
//! let ledger = Ledger::open_with_metrics(&cfg, store, Some(registry.ledger.clone()))?;
//!
//! // In the `/metrics` handler:
//! let body = registry.gather_text();
//! ```

pub mod prometheus;

pub use prometheus::{LedgerMetrics, MetricsRegistry};
