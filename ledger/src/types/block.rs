// ledger/src/types/block.rs

//! Block types and hashing.
//!
//! This module defines the block data structure used by the ledger,
//! together with the canonical fingerprint routine.
//!
//! A fingerprint is the SHA-256 of the canonical encoding of
//! `{data, index, nonce, previous_hash, timestamp}`, where `data` is the
//! payload's own canonical encoding embedded *as a string*. Embedding the
//! payload as text keeps the fingerprint byte-stable across a save/load
//! cycle, because the chain file stores exactly that string.

use serde::{Deserialize, Serialize};

use super::canonical::{to_canonical_string, write_canonical};
use super::tx::EvidenceTransaction;
use super::{BlockHash, GENESIS_PARENT};
use crate::chain::error::MalformedBlockError;

/// Fixed descriptive record carried by the genesis block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenesisMarker {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub version: String,
}

impl Default for GenesisMarker {
    fn default() -> Self {
        Self {
            kind: "genesis".to_string(),
            message: "EviChain Genesis Block".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

/// Block payload: either the genesis marker or a batch of transactions.
///
/// Untagged on the wire: `{"transactions": [...]}` or the marker's fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Transactions {
        transactions: Vec<EvidenceTransaction>,
    },
    Genesis(GenesisMarker),
}

impl Payload {
    /// Transactions carried by this payload (empty for genesis).
    pub fn transactions(&self) -> &[EvidenceTransaction] {
        match self {
            Payload::Transactions { transactions } => transactions,
            Payload::Genesis(_) => &[],
        }
    }

    /// Canonical string embedded as `data` in the block preimage.
    pub fn canonical_data(&self) -> Result<String, MalformedBlockError> {
        to_canonical_string(self)
    }
}

/// Hashed portion of a block.
///
/// Field declaration order is alphabetical, which makes the serializer's
/// natural order the canonical one; `data` is already a canonical string.
#[derive(Serialize)]
pub(crate) struct BlockPreimage<'a> {
    pub data: &'a str,
    pub index: u64,
    pub nonce: u64,
    pub previous_hash: &'a str,
    pub timestamp: f64,
}

impl BlockPreimage<'_> {
    pub fn encode(&self) -> Result<String, MalformedBlockError> {
        write_canonical(self)
    }

    pub fn fingerprint(&self) -> Result<BlockHash, MalformedBlockError> {
        Ok(BlockHash::digest(self.encode()?.as_bytes()))
    }
}

/// One committed batch of evidence.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Position in the chain; 0 for genesis.
    pub index: u64,

    /// Construction time, seconds since the Unix epoch. Display only.
    pub timestamp: f64,

    pub payload: Payload,

    /// Fingerprint of the preceding block, or `"0"` for genesis.
    pub previous_hash: BlockHash,

    /// Proof-of-work counter found by the miner.
    pub nonce: u64,

    /// Fingerprint of this block including `nonce`.
    pub hash: BlockHash,
}

impl Block {
    /// Builds an unmined block with `nonce = 0` and its initial fingerprint.
    pub fn new(
        index: u64,
        timestamp: f64,
        payload: Payload,
        previous_hash: BlockHash,
    ) -> Result<Self, MalformedBlockError> {
        let mut block = Self {
            index,
            timestamp,
            payload,
            previous_hash,
            nonce: 0,
            hash: BlockHash(String::new()),
        };
        block.hash = block.fingerprint()?;
        Ok(block)
    }

    /// Builds an unmined genesis block.
    pub fn genesis(timestamp: f64, marker: GenesisMarker) -> Result<Self, MalformedBlockError> {
        Self::new(
            0,
            timestamp,
            Payload::Genesis(marker),
            BlockHash::genesis_parent(),
        )
    }

    /// Canonical text that [`Block::fingerprint`] hashes.
    pub fn preimage(&self) -> Result<String, MalformedBlockError> {
        let data = self.payload.canonical_data()?;
        self.preimage_with(&data, self.nonce).encode()
    }

    pub(crate) fn preimage_with<'a>(&'a self, data: &'a str, nonce: u64) -> BlockPreimage<'a> {
        BlockPreimage {
            data,
            index: self.index,
            nonce,
            previous_hash: self.previous_hash.as_str(),
            timestamp: self.timestamp,
        }
    }

    /// Recomputes the fingerprint from the block's current fields.
    pub fn fingerprint(&self) -> Result<BlockHash, MalformedBlockError> {
        Ok(BlockHash::digest(self.preimage()?.as_bytes()))
    }

    /// Returns `true` if the stored `hash` matches a fresh fingerprint.
    pub fn has_valid_hash(&self) -> Result<bool, MalformedBlockError> {
        Ok(self.fingerprint()? == self.hash)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash.as_str() == GENESIS_PARENT
    }

    /// Transactions committed by this block (empty for genesis).
    pub fn transactions(&self) -> &[EvidenceTransaction] {
        self.payload.transactions()
    }
}
