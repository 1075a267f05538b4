use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ConfigError;
use crate::types::Difficulty;

/// Proof-of-work parameters.
///
/// Only `difficulty` shapes the chain; the limits bound how long a single
/// commit may spend searching before it gives up.
#[derive(Clone, Debug)]
pub struct MiningConfig {
    /// Required number of leading zero hex characters.
    pub difficulty: Difficulty,
    /// Give up after this many hashing attempts.
    pub max_iterations: Option<u64>,
    /// Give up after this much wall-clock time.
    pub timeout: Option<Duration>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::DEFAULT,
            max_iterations: None,
            timeout: None,
        }
    }
}

/// What to do when the stored chain is unreadable or fails verification.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RecoveryPolicy {
    /// Log, optionally quarantine the old file, and start over from a fresh
    /// genesis block. Keeps the service available.
    #[default]
    RegenerateGenesis,
    /// Refuse to start; an operator has to inspect the stored chain.
    FailClosed,
}

impl FromStr for RecoveryPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regenerate" | "regenerate-genesis" => Ok(RecoveryPolicy::RegenerateGenesis),
            "fail-closed" | "fail_closed" | "failclosed" => Ok(RecoveryPolicy::FailClosed),
            _ => Err(ConfigError::InvalidValue {
                key: "recovery policy",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RecoveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryPolicy::RegenerateGenesis => f.write_str("regenerate"),
            RecoveryPolicy::FailClosed => f.write_str("fail-closed"),
        }
    }
}

/// Recovery behaviour applied by [`crate::Ledger::open`].
#[derive(Clone, Debug)]
pub struct RecoveryConfig {
    pub policy: RecoveryPolicy,
    /// Move an unreadable or corrupt chain aside before regenerating, so the
    /// tampered data survives for inspection.
    pub quarantine_corrupt: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            policy: RecoveryPolicy::RegenerateGenesis,
            quarantine_corrupt: true,
        }
    }
}
