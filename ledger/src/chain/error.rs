//! Error types for the ledger.
//!
//! The split mirrors how each failure is handled:
//!
//! - [`MalformedBlockError`] is a programming defect and always propagates,
//! - [`ChainFault`] describes why a chain failed verification and feeds the
//!   recovery policy on load,
//! - [`MiningError`] aborts a commit before anything is mutated,
//! - [`LedgerError`] is what callers of the ledger see.

use std::time::Duration;

use thiserror::Error;

use crate::storage::StorageError;

/// A block (or part of one) could not be canonically serialized.
#[derive(Debug, Error)]
#[error("block is not canonically serializable: {message}")]
pub struct MalformedBlockError {
    message: String,
}

impl MalformedBlockError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MalformedBlockError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// First integrity violation found while verifying a chain.
#[derive(Debug, Error)]
pub enum ChainFault {
    #[error("chain has no blocks")]
    Empty,

    #[error("block at position {position} carries index {found}")]
    IndexMismatch { position: usize, found: u64 },

    #[error("genesis block has previous_hash {found:?}, expected \"0\"")]
    GenesisParent { found: String },

    #[error("block {index}: stored hash {stored} does not match recomputed {computed}")]
    HashMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    #[error("block {index}: previous_hash {found} does not link to predecessor hash {expected}")]
    BrokenLink {
        index: u64,
        expected: String,
        found: String,
    },

    #[error("block {index} cannot be fingerprinted: {source}")]
    Malformed {
        index: u64,
        #[source]
        source: MalformedBlockError,
    },
}

/// Why a proof-of-work search stopped without a solution.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("no solution within {limit} hashing attempts")]
    IterationLimit { limit: u64 },

    #[error("no solution within {timeout:?}")]
    DeadlineExceeded { timeout: Duration },

    #[error("mining cancelled")]
    Cancelled,

    #[error("nonce space exhausted")]
    NonceExhausted,

    #[error(transparent)]
    Malformed(#[from] MalformedBlockError),
}

/// High-level errors returned by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Stored chain missing or unparsable and the recovery policy fails closed.
    #[error("stored chain is unreadable: {0}")]
    StorageUnreadable(#[source] StorageError),

    /// Stored chain parsed but failed verification and the policy fails closed.
    #[error("stored chain is corrupt: {0}")]
    ChainCorrupt(#[source] ChainFault),

    /// Durable write failed; the in-memory chain was rolled back.
    #[error("failed to persist chain: {0}")]
    PersistenceWrite(#[source] StorageError),

    #[error(transparent)]
    Mining(#[from] MiningError),

    #[error(transparent)]
    Malformed(#[from] MalformedBlockError),

    #[error("block index overflow")]
    IndexOverflow,

    #[error("ledger has no blocks")]
    EmptyChain,

    #[error("ledger lock poisoned by a panicked writer")]
    Poisoned,
}
