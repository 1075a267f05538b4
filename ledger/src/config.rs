//! Top-level configuration for the ledger.
//!
//! This module aggregates configuration for:
//!
//! - mining parameters (`MiningConfig`),
//! - storage (chain file path),
//! - recovery from an unreadable or corrupt stored chain (`RecoveryConfig`),
//! - metrics (enable flag).
//!
//! The goal is to have a single `LedgerConfig` struct that binaries can
//! construct from defaults and overlay with environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::chain::config::{MiningConfig, RecoveryConfig, RecoveryPolicy};
use crate::storage::JsonStoreConfig;
use crate::types::Difficulty;

pub const ENV_DIFFICULTY: &str = "EVICHAIN_DIFFICULTY";
pub const ENV_DATA_FILE: &str = "EVICHAIN_DATA_FILE";
pub const ENV_RECOVERY: &str = "EVICHAIN_RECOVERY";
pub const ENV_QUARANTINE: &str = "EVICHAIN_QUARANTINE";
pub const ENV_MAX_MINING_ITERATIONS: &str = "EVICHAIN_MAX_MINING_ITERATIONS";
pub const ENV_MINING_TIMEOUT_SECS: &str = "EVICHAIN_MINING_TIMEOUT_SECS";
pub const ENV_METRICS: &str = "EVICHAIN_METRICS";

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("difficulty {0} is out of range (0..=64)")]
    InvalidDifficulty(u32),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Configuration for the metrics registry.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to record and expose metrics.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Top-level configuration for a ledger.
///
/// This aggregates all the sub-configs needed to open one:
///
/// - proof-of-work tuning (`mining`),
/// - the chain file (`storage`),
/// - load-time recovery (`recovery`),
/// - Prometheus metrics (`metrics`).
#[derive(Clone, Debug, Default)]
pub struct LedgerConfig {
    pub mining: MiningConfig,
    pub storage: JsonStoreConfig,
    pub recovery: RecoveryConfig,
    pub metrics: MetricsConfig,
}

impl LedgerConfig {
    /// Defaults overlaid with the `EVICHAIN_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    ///
    /// Unset variables keep the default; set but invalid ones are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(ENV_DIFFICULTY) {
            let level: u32 = parse(ENV_DIFFICULTY, &raw)?;
            cfg.mining.difficulty = Difficulty::new(level)?;
        }
        if let Some(raw) = lookup(ENV_DATA_FILE) {
            if raw.trim().is_empty() {
                return Err(invalid(ENV_DATA_FILE, &raw));
            }
            cfg.storage.path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup(ENV_RECOVERY) {
            cfg.recovery.policy = raw.parse::<RecoveryPolicy>()?;
        }
        if let Some(raw) = lookup(ENV_QUARANTINE) {
            cfg.recovery.quarantine_corrupt = parse_bool(ENV_QUARANTINE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_MINING_ITERATIONS) {
            cfg.mining.max_iterations = Some(parse(ENV_MAX_MINING_ITERATIONS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_MINING_TIMEOUT_SECS) {
            cfg.mining.timeout = Some(parse_secs(ENV_MINING_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_METRICS) {
            cfg.metrics.enabled = parse_bool(ENV_METRICS, &raw)?;
        }

        Ok(cfg)
    }
}

fn invalid(key: &'static str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

pub fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}

/// Parses non-negative, finite (fractional) seconds into a [`Duration`].
pub fn parse_secs(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = parse(key, raw)?;
    Duration::try_from_secs_f64(secs).map_err(|_| invalid(key, raw))
}
