//! Proof-of-work search.
//!
//! The miner takes a candidate block and increments its nonce until the
//! fingerprint satisfies the configured [`Difficulty`]. The search is
//! deterministic for a given block and starting nonce. It is also
//! CPU-bound and can be long, so it is bounded by an optional iteration cap,
//! an optional wall-clock timeout and a caller-held [`CancelToken`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::debug;

use crate::types::{Block, Difficulty};

use super::config::MiningConfig;
use super::error::MiningError;

/// How often (in attempts) the deadline and cancel flag are polled.
const POLL_INTERVAL: u64 = 1024;

/// Cloneable flag that aborts an in-flight search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Configurable proof-of-work miner.
///
/// Stateless with respect to the chain; the ledger hands it a candidate
/// block and appends whatever comes back.
#[derive(Clone, Debug)]
pub struct Miner {
    pub difficulty: Difficulty,
    pub max_iterations: Option<u64>,
    pub timeout: Option<std::time::Duration>,
}

impl Miner {
    /// Constructs a miner from a [`MiningConfig`].
    pub fn from_config(cfg: &MiningConfig) -> Self {
        Self {
            difficulty: cfg.difficulty,
            max_iterations: cfg.max_iterations,
            timeout: cfg.timeout,
        }
    }

    /// A miner with no iteration or time limit.
    pub fn unbounded(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            max_iterations: None,
            timeout: None,
        }
    }

    /// Searches for a nonce, starting from `block.nonce`.
    ///
    /// Returns the block with `nonce` and `hash` set to the first solution.
    /// On error the caller's state is untouched; the candidate is dropped.
    pub fn mine(&self, mut block: Block, cancel: Option<&CancelToken>) -> Result<Block, MiningError> {
        // The payload never changes between attempts, encode it once.
        let data = block.payload.canonical_data()?;
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);

        let mut nonce = block.nonce;
        let mut attempts: u64 = 0;

        loop {
            let hash = block.preimage_with(&data, nonce).fingerprint()?;
            attempts += 1;

            if self.difficulty.is_satisfied_by(&hash) {
                debug!(
                    index = block.index,
                    nonce,
                    attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "proof of work found"
                );
                block.nonce = nonce;
                block.hash = hash;
                return Ok(block);
            }

            if let Some(limit) = self.max_iterations {
                if attempts >= limit {
                    return Err(MiningError::IterationLimit { limit });
                }
            }

            if attempts % POLL_INTERVAL == 0 {
                if cancel.is_some_and(CancelToken::is_cancelled) {
                    return Err(MiningError::Cancelled);
                }
                if let (Some(deadline), Some(timeout)) = (deadline, self.timeout) {
                    if Instant::now() >= deadline {
                        return Err(MiningError::DeadlineExceeded { timeout });
                    }
                }
            }

            nonce = nonce.checked_add(1).ok_or(MiningError::NonceExhausted)?;
        }
    }
}

/// Mines `block` at `difficulty` with no limits.
pub fn mine(block: Block, difficulty: Difficulty) -> Result<Block, MiningError> {
    Miner::unbounded(difficulty).mine(block, None)
}
