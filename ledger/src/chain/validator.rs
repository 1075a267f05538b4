//! Chain integrity verification.
//!
//! Every stored hash is recomputed, never trusted. A chain is valid when:
//!
//! - it has at least one block,
//! - each block's `index` equals its position,
//! - the genesis block's `previous_hash` is the `"0"` sentinel,
//! - each block's stored `hash` equals its recomputed fingerprint
//!   (genesis included),
//! - each block after genesis links to its predecessor's stored `hash`.
//!
//! Proof-of-work is not re-checked: difficulty is deployment configuration
//! and may differ between blocks written at different times.

use crate::types::Block;

use super::error::ChainFault;

/// Returns the first integrity violation in `blocks`, if any.
pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainFault> {
    let Some(genesis) = blocks.first() else {
        return Err(ChainFault::Empty);
    };

    if !genesis.previous_hash.is_genesis_parent() {
        return Err(ChainFault::GenesisParent {
            found: genesis.previous_hash.to_string(),
        });
    }

    for (position, block) in blocks.iter().enumerate() {
        if block.index != position as u64 {
            return Err(ChainFault::IndexMismatch {
                position,
                found: block.index,
            });
        }

        verify_hash(block)?;

        if position > 0 {
            let previous = &blocks[position - 1];
            if block.previous_hash != previous.hash {
                return Err(ChainFault::BrokenLink {
                    index: block.index,
                    expected: previous.hash.to_string(),
                    found: block.previous_hash.to_string(),
                });
            }
        }
    }

    Ok(())
}

fn verify_hash(block: &Block) -> Result<(), ChainFault> {
    let computed = block.fingerprint().map_err(|source| ChainFault::Malformed {
        index: block.index,
        source,
    })?;

    if computed != block.hash {
        return Err(ChainFault::HashMismatch {
            index: block.index,
            stored: block.hash.to_string(),
            computed: computed.to_string(),
        });
    }
    Ok(())
}
