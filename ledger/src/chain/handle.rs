//! Thread-safe handle around a [`Ledger`].
//!
//! All mutation goes through one `Mutex`, so concurrent submitters never
//! interleave a stage with a half-finished commit, and two commits never
//! mine on top of the same tip. Reads take the same lock and therefore
//! always observe a committed state.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::types::{Block, EvidenceSubmission, TransactionId};

use super::error::{LedgerError, MiningError};
use super::ledger::{ChainSummary, Ledger};
use super::miner::CancelToken;
use super::store::ChainStore;

/// Result of [`SharedLedger::submit`].
#[derive(Clone, Debug)]
pub struct Submitted {
    pub id: TransactionId,
    /// The block that sealed the transaction.
    pub block: Block,
}

/// Cloneable, `Send + Sync` handle to a single ledger.
pub struct SharedLedger<S> {
    inner: Arc<Mutex<Ledger<S>>>,
}

impl<S> Clone for SharedLedger<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> SharedLedger<S>
where
    S: ChainStore,
{
    pub fn new(ledger: Ledger<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger<S>>, LedgerError> {
        self.inner.lock().map_err(|_| LedgerError::Poisoned)
    }

    pub fn stage(&self, submission: EvidenceSubmission) -> Result<TransactionId, LedgerError> {
        self.lock()?.stage(submission)
    }

    pub fn commit_pending(&self) -> Result<Option<Block>, LedgerError> {
        self.lock()?.commit_pending()
    }

    pub fn commit_pending_with(&self, cancel: &CancelToken) -> Result<Option<Block>, LedgerError> {
        self.lock()?.commit_pending_with(cancel)
    }

    /// Stages `submission` and immediately commits everything pending.
    ///
    /// All or nothing: on success the submission is sealed in the returned
    /// block; on any error it is removed from the queue again, so a failed
    /// call never leaves it to be committed later. A token cancelled before
    /// the lock is acquired stops the call before anything is staged.
    pub fn submit(
        &self,
        submission: EvidenceSubmission,
        cancel: Option<&CancelToken>,
    ) -> Result<Submitted, LedgerError> {
        let mut ledger = self.lock()?;
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(MiningError::Cancelled.into());
        }

        let id = ledger.stage(submission)?;
        match ledger.seal_pending(cancel) {
            Ok(block) => Ok(Submitted { id, block }),
            Err(e) => {
                ledger.unstage(&id);
                Err(e)
            }
        }
    }

    pub fn summary(&self) -> Result<ChainSummary, LedgerError> {
        Ok(self.lock()?.chain_summary())
    }

    /// Chain length if the lock is free right now, without waiting.
    pub fn try_height(&self) -> Option<usize> {
        self.inner.try_lock().ok().map(|l| l.blocks().len())
    }

    /// Runs `f` against the ledger while holding the lock.
    pub fn read<T>(&self, f: impl FnOnce(&Ledger<S>) -> T) -> Result<T, LedgerError> {
        Ok(f(&*self.lock()?))
    }
}
