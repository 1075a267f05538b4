//! Core domain types used by the ledger
//!
//! This module defines strongly-typed hashes, transaction identifiers and
//! the proof-of-work difficulty that are shared across the ledger
//! implementation. The goal is to avoid "naked" strings in public APIs and
//! instead use domain-specific newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

pub mod block;
pub mod canonical;
pub mod tx;

pub use block::{Block, GenesisMarker, Payload};
pub use canonical::{CanonicalFormatter, canonicalize, sha256_hex, to_canonical_string};
pub use tx::{ComplaintMetadata, EvidenceSubmission, EvidenceTransaction, EvidenceTransactionView};

/// Length in hex characters of a SHA-256 digest.
pub const HASH_HEX_LEN: usize = 64;

/// Sentinel stored as the `previous_hash` of the genesis block.
///
/// It is deliberately not a valid digest, so it can never collide with the
/// fingerprint of a real block.
pub const GENESIS_PARENT: &str = "0";

/// Strongly-typed block fingerprint (lowercase hex SHA-256).
///
/// The same type is used for `previous_hash`, which for the genesis block
/// carries [`GENESIS_PARENT`] instead of a digest.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHash(pub String);

impl BlockHash {
    /// Parent reference of the genesis block.
    pub fn genesis_parent() -> Self {
        BlockHash(GENESIS_PARENT.to_string())
    }

    /// Hashes `preimage` with SHA-256.
    pub fn digest(preimage: &[u8]) -> Self {
        BlockHash(sha256_hex(preimage))
    }

    /// Returns the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the genesis parent sentinel.
    pub fn is_genesis_parent(&self) -> bool {
        self.0 == GENESIS_PARENT
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier assigned to an evidence transaction when it is staged.
///
/// Ids are human-legible (`EVC-<year>-<n>`) and never reassigned; see
/// [`crate::chain::ids::IdGenerator`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Proof-of-work difficulty: the number of leading `'0'` hex characters a
/// block fingerprint must have.
///
/// Each extra level multiplies the expected number of hashing attempts by
/// 16. Zero accepts any fingerprint.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u8);

impl Difficulty {
    /// Difficulty used when nothing is configured.
    pub const DEFAULT: Difficulty = Difficulty(4);

    /// Validates and wraps a difficulty level (0..=64).
    pub fn new(level: u32) -> Result<Self, ConfigError> {
        if level as usize > HASH_HEX_LEN {
            return Err(ConfigError::InvalidDifficulty(level));
        }
        Ok(Difficulty(level as u8))
    }

    pub fn level(&self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if `hash` starts with at least `level` zero characters.
    pub fn is_satisfied_by(&self, hash: &BlockHash) -> bool {
        let level = self.level();
        hash.0.len() >= level && hash.0.bytes().take(level).all(|b| b == b'0')
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = ConfigError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        Difficulty::new(level)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> Self {
        d.0 as u32
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
