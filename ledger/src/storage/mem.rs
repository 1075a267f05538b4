//! In-memory chain store.
//!
//! This implementation is useful for unit tests and embedding. Clones share
//! the same backing state, so a test can keep a handle after moving the
//! store into a ledger and inspect writes or inject failures.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::chain::store::ChainStore;
use crate::types::Block;

use super::StorageError;

#[derive(Default)]
struct MemState {
    blocks: Option<Vec<Block>>,
    unreadable: Option<String>,
    fail_writes: bool,
    writes: usize,
    quarantined: Vec<Vec<Block>>,
}

/// In-memory implementation of [`ChainStore`].
#[derive(Clone, Default)]
pub struct InMemoryChainStore {
    state: Arc<Mutex<MemState>>,
}

impl InMemoryChainStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `blocks`.
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        let store = Self::default();
        store.state().blocks = Some(blocks);
        store
    }

    /// Creates a store whose content cannot be read back.
    pub fn unreadable(reason: impl Into<String>) -> Self {
        let store = Self::default();
        store.state().unreadable = Some(reason.into());
        store
    }

    /// Makes every subsequent `save` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Copy of the currently stored chain.
    pub fn snapshot(&self) -> Option<Vec<Block>> {
        self.state().blocks.clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    /// Number of times content was moved aside.
    pub fn quarantined_count(&self) -> usize {
        self.state().quarantined.len()
    }

    fn state(&self) -> MutexGuard<'_, MemState> {
        // A panic while holding the lock cannot leave MemState half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ChainStore for InMemoryChainStore {
    fn load(&self) -> Result<Option<Vec<Block>>, StorageError> {
        let state = self.state();
        if let Some(reason) = &state.unreadable {
            return Err(StorageError::InvalidRecord {
                position: 0,
                reason: reason.clone(),
            });
        }
        Ok(state.blocks.clone())
    }

    fn save(&mut self, chain: &[Block]) -> Result<(), StorageError> {
        let mut state = self.state();
        if state.fail_writes {
            return Err(StorageError::WriteRejected {
                location: "memory".to_string(),
            });
        }
        state.blocks = Some(chain.to_vec());
        state.unreadable = None;
        state.writes += 1;
        Ok(())
    }

    fn quarantine(&mut self) -> Result<Option<String>, StorageError> {
        let mut state = self.state();
        state.unreadable = None;
        let Some(blocks) = state.blocks.take() else {
            return Ok(None);
        };
        state.quarantined.push(blocks);
        Ok(Some(format!("memory quarantine #{}", state.quarantined.len())))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
