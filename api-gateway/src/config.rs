//! API gateway configuration.
//!
//! Configures the HTTP listen address and how long a submission may wait
//! for its block to be mined. The ledger itself is configured through
//! `ledger::LedgerConfig::from_env()`.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use ledger::ConfigError;
use ledger::config::parse_secs;

pub const ENV_LISTEN_ADDR: &str = "EVICHAIN_LISTEN_ADDR";
pub const ENV_COMMIT_TIMEOUT_SECS: &str = "EVICHAIN_COMMIT_TIMEOUT_SECS";

/// Configuration for the API gateway HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// Upper bound on stage + mine + persist for one submission.
    pub commit_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        // Bind to all interfaces so a container port mapping is reachable
        // from the host.
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 5000)),
            commit_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_LISTEN_ADDR) {
            cfg.listen_addr = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_LISTEN_ADDR,
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(ENV_COMMIT_TIMEOUT_SECS) {
            cfg.commit_timeout = parse_secs(ENV_COMMIT_TIMEOUT_SECS, &raw)?;
        }
        Ok(cfg)
    }
}
