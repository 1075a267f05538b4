//! Storage abstraction used by the ledger.

use crate::storage::StorageError;
use crate::types::Block;

/// Durable home of the chain.
///
/// Implementations can be backed by a JSON file, memory, etc. The ledger
/// always writes the whole chain and reads it back whole; there is no
/// partial update.
pub trait ChainStore {
    /// Reads the persisted chain.
    ///
    /// `Ok(None)` means nothing has been persisted yet. Unparsable content
    /// is an error, not an empty chain.
    fn load(&self) -> Result<Option<Vec<Block>>, StorageError>;

    /// Replaces the persisted chain with `chain`.
    ///
    /// Must either fully succeed or leave the previous content in place.
    fn save(&mut self, chain: &[Block]) -> Result<(), StorageError>;

    /// Moves unreadable or corrupt content aside before it is overwritten.
    ///
    /// Returns a description of where it went, if anywhere.
    fn quarantine(&mut self) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}
