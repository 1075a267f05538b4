//! The ledger: chain + pending queue + persistence.
//!
//! The ledger wires together:
//!
//! - a [`ChainStore`] for durable storage,
//! - a [`Miner`] for sealing blocks,
//! - the in-memory chain and the queue of staged transactions.
//!
//! It is the sole owner of both the chain and the queue. Share it between
//! threads through [`super::handle::SharedLedger`], which puts the single
//! lock around every mutating operation.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::config::LedgerConfig;
use crate::metrics::LedgerMetrics;
use crate::storage::StorageError;
use crate::types::{
    Block, BlockHash, Difficulty, EvidenceSubmission, EvidenceTransaction,
    EvidenceTransactionView, GenesisMarker, Payload, TransactionId,
};

use super::config::{RecoveryConfig, RecoveryPolicy};
use super::error::{ChainFault, LedgerError, MiningError};
use super::ids::IdGenerator;
use super::miner::{CancelToken, Miner};
use super::store::ChainStore;
use super::validator::verify_chain;

/// Aggregate view of the chain for presentation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChainSummary {
    pub total_blocks: usize,
    pub last_block_hash: BlockHash,
    pub difficulty: Difficulty,
    pub is_valid: bool,
}

/// Why the stored chain could not be used as-is.
enum LoadFailure {
    Unreadable(StorageError),
    Corrupt(ChainFault),
}

/// Single-authority, tamper-evident append log of evidence blocks.
pub struct Ledger<S> {
    store: S,
    miner: Miner,
    recovery: RecoveryConfig,
    chain: Vec<Block>,
    pending: Vec<EvidenceTransaction>,
    ids: IdGenerator,
    metrics: Option<LedgerMetrics>,
}

impl<S> Ledger<S>
where
    S: ChainStore,
{
    /// Loads the persisted chain or starts a new one.
    ///
    /// A missing store always yields a fresh genesis block, persisted
    /// immediately. An unreadable or corrupt store is handled according to
    /// `config.recovery`: regenerate (optionally quarantining the old data)
    /// or fail with [`LedgerError::StorageUnreadable`] /
    /// [`LedgerError::ChainCorrupt`].
    pub fn open(config: &LedgerConfig, store: S) -> Result<Self, LedgerError> {
        Self::open_with_metrics(config, store, None)
    }

    /// Same as [`Ledger::open`], recording into `metrics`.
    pub fn open_with_metrics(
        config: &LedgerConfig,
        store: S,
        metrics: Option<LedgerMetrics>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::empty(config, store, metrics);

        match ledger.load_verified() {
            Ok(Some(blocks)) => {
                info!(
                    store = %ledger.store.describe(),
                    blocks = blocks.len(),
                    "loaded chain"
                );
                ledger.adopt(blocks);
            }
            Ok(None) => {
                info!(store = %ledger.store.describe(), "no stored chain, creating genesis block");
                ledger.write_genesis()?;
            }
            Err(failure) => ledger.recover(failure)?,
        }

        ledger.update_gauges();
        Ok(ledger)
    }

    /// Loads an existing chain without ever writing.
    ///
    /// Intended for inspection tooling: a missing, unreadable or corrupt
    /// store is an error regardless of the recovery policy.
    pub fn open_existing(config: &LedgerConfig, store: S) -> Result<Self, LedgerError> {
        let mut ledger = Self::empty(config, store, None);
        match ledger.load_verified() {
            Ok(Some(blocks)) => {
                ledger.adopt(blocks);
                Ok(ledger)
            }
            Ok(None) => Err(LedgerError::StorageUnreadable(StorageError::NotFound {
                location: ledger.store.describe(),
            })),
            Err(LoadFailure::Unreadable(e)) => Err(LedgerError::StorageUnreadable(e)),
            Err(LoadFailure::Corrupt(fault)) => Err(LedgerError::ChainCorrupt(fault)),
        }
    }

    fn empty(config: &LedgerConfig, store: S, metrics: Option<LedgerMetrics>) -> Self {
        Self {
            store,
            miner: Miner::from_config(&config.mining),
            recovery: config.recovery.clone(),
            chain: Vec::new(),
            pending: Vec::new(),
            ids: IdGenerator::new(),
            metrics,
        }
    }

    /// Installs a verified chain and reserves the ids it already uses.
    fn adopt(&mut self, blocks: Vec<Block>) {
        self.ids
            .reserve(blocks.iter().flat_map(|b| b.transactions()).map(|tx| &tx.id));
        self.chain = blocks;
    }

    fn load_verified(&self) -> Result<Option<Vec<Block>>, LoadFailure> {
        let Some(blocks) = self.store.load().map_err(LoadFailure::Unreadable)? else {
            return Ok(None);
        };
        verify_chain(&blocks).map_err(LoadFailure::Corrupt)?;
        Ok(Some(blocks))
    }

    fn recover(&mut self, failure: LoadFailure) -> Result<(), LedgerError> {
        let reason = match &failure {
            LoadFailure::Unreadable(e) => e.to_string(),
            LoadFailure::Corrupt(fault) => fault.to_string(),
        };

        if self.recovery.policy == RecoveryPolicy::FailClosed {
            error!(store = %self.store.describe(), %reason, "stored chain rejected, failing closed");
            return Err(match failure {
                LoadFailure::Unreadable(e) => LedgerError::StorageUnreadable(e),
                LoadFailure::Corrupt(fault) => LedgerError::ChainCorrupt(fault),
            });
        }

        let quarantined = if self.recovery.quarantine_corrupt {
            match self.store.quarantine() {
                Ok(location) => location,
                Err(e) => {
                    warn!(error = %e, "could not quarantine stored chain");
                    None
                }
            }
        } else {
            None
        };

        warn!(
            store = %self.store.describe(),
            %reason,
            quarantined = quarantined.as_deref().unwrap_or("no"),
            "stored chain discarded, regenerating genesis block"
        );
        if let Some(m) = &self.metrics {
            m.chain_recoveries.inc();
        }

        self.write_genesis()
    }

    fn write_genesis(&mut self) -> Result<(), LedgerError> {
        let candidate = Block::genesis(now_epoch_seconds(), GenesisMarker::default())?;
        let genesis = self.miner.mine(candidate, None)?;

        self.store
            .save(std::slice::from_ref(&genesis))
            .map_err(LedgerError::PersistenceWrite)?;

        info!(hash = %genesis.hash, nonce = genesis.nonce, "genesis block created");
        self.chain = vec![genesis];
        Ok(())
    }

    /// Stages a complaint for the next block and returns its id.
    ///
    /// Never blocks on mining and never touches storage.
    pub fn stage(&mut self, submission: EvidenceSubmission) -> Result<TransactionId, LedgerError> {
        let now = OffsetDateTime::now_utc();
        let id = self.ids.next_id(now);
        let tx = EvidenceTransaction::from_submission(id.clone(), unix_seconds(now), submission)?;

        self.pending.push(tx);
        if let Some(m) = &self.metrics {
            m.transactions_staged.inc();
            m.pending_transactions.set(self.pending.len() as i64);
        }
        Ok(id)
    }

    /// Seals every pending transaction into one new block.
    ///
    /// Returns `Ok(None)` without side effects when nothing is pending.
    /// Otherwise the block is mined, appended and the whole chain persisted
    /// before the queue is cleared. If mining or the write fails, the chain
    /// and queue are exactly as they were before the call.
    pub fn commit_pending(&mut self) -> Result<Option<Block>, LedgerError> {
        self.commit(None)
    }

    /// [`Ledger::commit_pending`] with a cancellation token for the search.
    pub fn commit_pending_with(&mut self, cancel: &CancelToken) -> Result<Option<Block>, LedgerError> {
        self.commit(Some(cancel))
    }

    fn commit(&mut self, cancel: Option<&CancelToken>) -> Result<Option<Block>, LedgerError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        self.seal_pending(cancel).map(Some)
    }

    /// Drops a staged transaction that has not been committed yet.
    ///
    /// Returns `false` if `id` is not in the queue. The id stays reserved.
    pub(crate) fn unstage(&mut self, id: &TransactionId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|tx| &tx.id != id);
        let removed = self.pending.len() != before;
        if removed {
            self.update_gauges();
        }
        removed
    }

    /// Mines, appends and persists a block holding the whole queue.
    ///
    /// The caller guarantees the queue is non-empty.
    pub(crate) fn seal_pending(&mut self, cancel: Option<&CancelToken>) -> Result<Block, LedgerError> {
        let started = Instant::now();
        let last = self.chain.last().ok_or(LedgerError::EmptyChain)?;
        let index = last.index.checked_add(1).ok_or(LedgerError::IndexOverflow)?;

        let candidate = Block::new(
            index,
            now_epoch_seconds(),
            Payload::Transactions {
                transactions: self.pending.clone(),
            },
            last.hash.clone(),
        )?;

        // A cancellation that lands after the search found a nonce still
        // aborts, as long as nothing was written yet.
        let mined = self.miner.mine(candidate, cancel).and_then(|block| match cancel {
            Some(token) if token.is_cancelled() => Err(MiningError::Cancelled),
            _ => Ok(block),
        });
        let block = match mined {
            Ok(block) => block,
            Err(e) => {
                warn!(index, error = %e, "mining aborted, pending transactions kept");
                self.record_failure();
                return Err(e.into());
            }
        };

        self.chain.push(block.clone());
        if let Err(e) = self.store.save(&self.chain) {
            self.chain.pop();
            error!(index, error = %e, "persisting block failed, rolled back");
            self.record_failure();
            return Err(LedgerError::PersistenceWrite(e));
        }
        self.pending.clear();

        let elapsed = started.elapsed();
        info!(
            index = block.index,
            hash = %block.hash,
            nonce = block.nonce,
            transactions = block.transactions().len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "block committed"
        );
        if let Some(m) = &self.metrics {
            m.blocks_committed.inc();
            m.mining_seconds.observe(elapsed.as_secs_f64());
            m.mining_hashes.observe(block.nonce.saturating_add(1) as f64);
        }
        self.update_gauges();

        Ok(block)
    }

    /// `true` if every block verifies; see [`verify_chain`].
    pub fn validate(&self) -> bool {
        self.verify().is_ok()
    }

    /// First integrity violation in the in-memory chain, if any.
    pub fn verify(&self) -> Result<(), ChainFault> {
        verify_chain(&self.chain)
    }

    /// Every committed transaction, in block order then staging order.
    ///
    /// Genesis is skipped. The iterator is lazy and borrows the chain, so
    /// each call reflects the latest committed state.
    pub fn query_all_transactions(&self) -> impl Iterator<Item = EvidenceTransactionView<'_>> + '_ {
        self.chain.iter().skip(1).flat_map(|block| {
            block
                .transactions()
                .iter()
                .map(move |tx| EvidenceTransactionView::new(block.index, tx))
        })
    }

    pub fn chain_summary(&self) -> ChainSummary {
        ChainSummary {
            total_blocks: self.chain.len(),
            last_block_hash: self
                .chain
                .last()
                .map(|b| b.hash.clone())
                .unwrap_or_else(|| BlockHash(String::new())),
            difficulty: self.miner.difficulty,
            is_valid: self.validate(),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.miner.difficulty
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn record_failure(&self) {
        if let Some(m) = &self.metrics {
            m.commit_failures.inc();
        }
    }

    fn update_gauges(&self) {
        if let Some(m) = &self.metrics {
            m.chain_height.set(self.chain.len() as i64);
            m.pending_transactions.set(self.pending.len() as i64);
        }
    }
}

fn unix_seconds(t: OffsetDateTime) -> f64 {
    t.unix_timestamp_nanos() as f64 / 1_000_000_000.0
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
///
/// A clock set before the epoch yields 0.
fn now_epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::config::MiningConfig;
    use crate::storage::InMemoryChainStore;

    fn dummy_config(difficulty: u32) -> LedgerConfig {
        let mut cfg = LedgerConfig::default();
        cfg.mining = MiningConfig {
            difficulty: Difficulty::new(difficulty).unwrap(),
            ..MiningConfig::default()
        };
        cfg
    }

    fn dummy_submission(assunto: &str) -> EvidenceSubmission {
        let mut submission = EvidenceSubmission::default();
        submission.metadata.titulo = Some(format!("titulo {assunto}"));
        submission.metadata.descricao = Some("descricao".into());
        submission.metadata.assunto = Some(assunto.into());
        submission.metadata.finalidade = Some("denuncia".into());
        submission.file_hashes = vec!["hash1".into(), "hash2".into()];
        submission
    }

    fn fresh_ledger(difficulty: u32) -> (Ledger<InMemoryChainStore>, InMemoryChainStore) {
        let store = InMemoryChainStore::new();
        let ledger = Ledger::open(&dummy_config(difficulty), store.clone()).expect("open");
        (ledger, store)
    }

    #[test]
    fn open_on_empty_store_creates_and_persists_genesis() {
        let (ledger, store) = fresh_ledger(1);

        assert_eq!(ledger.blocks().len(), 1);
        let genesis = ledger.last_block().unwrap();
        assert!(genesis.is_genesis());
        assert!(genesis.previous_hash.is_genesis_parent());
        assert!(genesis.hash.as_str().starts_with('0'));
        assert!(ledger.validate());

        assert_eq!(store.write_count(), 1);
        assert_eq!(store.snapshot().unwrap(), ledger.blocks());
    }

    #[test]
    fn commit_with_nothing_pending_is_a_no_op() {
        let (mut ledger, store) = fresh_ledger(1);

        assert!(ledger.commit_pending().unwrap().is_none());
        assert_eq!(ledger.blocks().len(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn staged_transactions_are_sealed_in_staging_order() {
        let (mut ledger, store) = fresh_ledger(1);

        let ids: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|s| ledger.stage(dummy_submission(s)).unwrap())
            .collect();
        assert_eq!(ledger.pending_len(), 3);
        assert_eq!(ledger.blocks().len(), 1);

        let block = ledger.commit_pending().unwrap().expect("block");

        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, ledger.blocks()[0].hash);
        let sealed: Vec<_> = block.transactions().iter().map(|tx| tx.id.clone()).collect();
        assert_eq!(sealed, ids);
        assert_eq!(ledger.pending_len(), 0);
        assert!(ledger.validate());
        assert_eq!(store.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn committed_hash_meets_configured_difficulty() {
        let (mut ledger, _) = fresh_ledger(2);

        ledger.stage(dummy_submission("x")).unwrap();
        let block = ledger.commit_pending().unwrap().expect("block");

        assert!(block.hash.as_str().starts_with("00"));
        assert_eq!(block.hash.as_str().len(), 64);
        assert!(block.has_valid_hash().unwrap());
    }

    #[test]
    fn successive_commits_link_together() {
        let (mut ledger, _) = fresh_ledger(1);

        ledger.stage(dummy_submission("a")).unwrap();
        let first = ledger.commit_pending().unwrap().unwrap();
        ledger.stage(dummy_submission("b")).unwrap();
        let second = ledger.commit_pending().unwrap().unwrap();

        assert_eq!(second.index, 2);
        assert_eq!(second.previous_hash, first.hash);
        assert!(ledger.validate());
    }

    #[test]
    fn reopening_restores_the_persisted_chain() {
        let (mut ledger, store) = fresh_ledger(1);
        ledger.stage(dummy_submission("a")).unwrap();
        ledger.commit_pending().unwrap();

        let reopened = Ledger::open(&dummy_config(1), store.clone()).expect("reopen");

        assert_eq!(reopened.blocks(), ledger.blocks());
        assert_eq!(reopened.pending_len(), 0);
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn corrupt_chain_is_regenerated_and_quarantined() {
        let (mut ledger, _) = fresh_ledger(1);
        ledger.stage(dummy_submission("a")).unwrap();
        ledger.commit_pending().unwrap();

        let mut tampered = ledger.blocks().to_vec();
        tampered[1].timestamp += 1.0;
        let store = InMemoryChainStore::with_blocks(tampered);

        let recovered = Ledger::open(&dummy_config(1), store.clone()).expect("open");

        assert_eq!(recovered.blocks().len(), 1);
        assert!(recovered.validate());
        assert_eq!(store.quarantined_count(), 1);
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn unreadable_store_is_regenerated() {
        let store = InMemoryChainStore::unreadable("truncated document");

        let ledger = Ledger::open(&dummy_config(1), store.clone()).expect("open");

        assert_eq!(ledger.blocks().len(), 1);
        assert!(ledger.last_block().unwrap().is_genesis());
        assert!(store.snapshot().is_some());
    }

    #[test]
    fn fail_closed_policy_refuses_corrupt_chain() {
        let (ledger, _) = fresh_ledger(1);
        let mut tampered = ledger.blocks().to_vec();
        tampered[0].nonce += 1;
        let store = InMemoryChainStore::with_blocks(tampered);

        let mut cfg = dummy_config(1);
        cfg.recovery.policy = RecoveryPolicy::FailClosed;

        let err = Ledger::open(&cfg, store.clone()).err().expect("must fail");
        assert!(matches!(err, LedgerError::ChainCorrupt(ChainFault::HashMismatch { index: 0, .. })));
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.quarantined_count(), 0);
    }

    #[test]
    fn fail_closed_policy_refuses_unreadable_store() {
        let mut cfg = dummy_config(1);
        cfg.recovery.policy = RecoveryPolicy::FailClosed;

        let err = Ledger::open(&cfg, InMemoryChainStore::unreadable("bad json"))
            .err()
            .expect("must fail");
        assert!(matches!(err, LedgerError::StorageUnreadable(_)));
    }

    #[test]
    fn failed_write_rolls_back_and_keeps_pending() {
        let (mut ledger, store) = fresh_ledger(1);
        ledger.stage(dummy_submission("a")).unwrap();
        ledger.stage(dummy_submission("b")).unwrap();

        store.set_fail_writes(true);
        let err = ledger.commit_pending().unwrap_err();

        assert!(matches!(err, LedgerError::PersistenceWrite(_)));
        assert_eq!(ledger.blocks().len(), 1);
        assert_eq!(ledger.pending_len(), 2);
        assert_eq!(store.snapshot().unwrap().len(), 1);

        store.set_fail_writes(false);
        let block = ledger.commit_pending().unwrap().expect("block");
        assert_eq!(block.index, 1);
        assert_eq!(block.transactions().len(), 2);
        assert_eq!(ledger.pending_len(), 0);
    }

    #[test]
    fn aborted_mining_keeps_pending_and_chain() {
        let (seed, _) = fresh_ledger(1);
        let store = InMemoryChainStore::with_blocks(seed.blocks().to_vec());

        let mut cfg = dummy_config(64);
        cfg.mining.max_iterations = Some(5);
        let mut ledger = Ledger::open(&cfg, store.clone()).expect("open");
        ledger.stage(dummy_submission("a")).unwrap();

        let err = ledger.commit_pending().unwrap_err();

        assert!(matches!(err, LedgerError::Mining(_)));
        assert_eq!(ledger.blocks().len(), 1);
        assert_eq!(ledger.pending_len(), 1);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn query_skips_genesis_and_preserves_order() {
        let (mut ledger, _) = fresh_ledger(1);
        assert_eq!(ledger.query_all_transactions().count(), 0);

        let a = ledger.stage(dummy_submission("a")).unwrap();
        let b = ledger.stage(dummy_submission("b")).unwrap();
        ledger.commit_pending().unwrap();
        let c = ledger.stage(dummy_submission("c")).unwrap();
        assert_eq!(ledger.query_all_transactions().count(), 2);
        ledger.commit_pending().unwrap();

        let views: Vec<_> = ledger
            .query_all_transactions()
            .map(|v| (v.id.clone(), v.block_index))
            .collect();
        assert_eq!(views, vec![(a, 1), (b, 1), (c, 2)]);
    }

    #[test]
    fn chain_summary_reports_tip_and_validity() {
        let (mut ledger, _) = fresh_ledger(1);
        ledger.stage(dummy_submission("a")).unwrap();
        let block = ledger.commit_pending().unwrap().unwrap();

        let summary = ledger.chain_summary();

        assert_eq!(summary.total_blocks, 2);
        assert_eq!(summary.last_block_hash, block.hash);
        assert_eq!(summary.difficulty, Difficulty::new(1).unwrap());
        assert!(summary.is_valid);
    }

    #[test]
    fn open_existing_never_writes() {
        let store = InMemoryChainStore::new();
        let err = Ledger::open_existing(&dummy_config(1), store.clone())
            .err()
            .expect("missing chain");
        assert!(matches!(err, LedgerError::StorageUnreadable(StorageError::NotFound { .. })));
        assert!(store.snapshot().is_none());

        let (seed, _) = fresh_ledger(1);
        let mut tampered = seed.blocks().to_vec();
        tampered[0].timestamp += 1.0;
        let store = InMemoryChainStore::with_blocks(tampered);
        let err = Ledger::open_existing(&dummy_config(1), store.clone())
            .err()
            .expect("corrupt chain");
        assert!(matches!(err, LedgerError::ChainCorrupt(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn two_field_complaint_is_sealed_at_difficulty_two() {
        let (mut ledger, _) = fresh_ledger(2);
        let mut submission = EvidenceSubmission::default();
        submission.metadata.titulo = Some("T".into());
        submission.metadata.descricao = Some("D".into());

        ledger.stage(submission).unwrap();
        let block = ledger.commit_pending().unwrap().expect("block");

        assert_eq!(ledger.chain_summary().total_blocks, 2);
        assert!(block.hash.as_str().starts_with("00"));
        assert!(ledger.validate());
    }

    #[test]
    fn reopened_ledger_never_reissues_a_committed_id() {
        let (mut ledger, store) = fresh_ledger(1);
        ledger.stage(dummy_submission("a")).unwrap();
        let block = ledger.commit_pending().unwrap().unwrap();
        let committed = &block.transactions()[0];

        let mut reopened = Ledger::open(&dummy_config(1), store).expect("reopen");
        // The float timestamp may round across a second boundary.
        let second = committed.timestamp.floor() as i64;
        let ids: Vec<_> = [second - 1, second, second + 1]
            .into_iter()
            .map(|s| reopened.ids.next_id(OffsetDateTime::from_unix_timestamp(s).unwrap()))
            .collect();

        assert!(ids.iter().all(|id| *id != committed.id));
        assert!(ids.iter().any(|id| id.as_str().starts_with(committed.id.as_str())));
    }

    #[test]
    fn unstage_removes_only_the_named_transaction() {
        let (mut ledger, _) = fresh_ledger(1);
        let a = ledger.stage(dummy_submission("a")).unwrap();
        let b = ledger.stage(dummy_submission("b")).unwrap();

        assert!(ledger.unstage(&b));
        assert!(!ledger.unstage(&b));
        assert_eq!(ledger.pending_len(), 1);

        let block = ledger.commit_pending().unwrap().unwrap();
        assert_eq!(block.transactions()[0].id, a);
    }

    #[test]
    fn cancelled_search_commits_nothing() {
        let (mut ledger, store) = fresh_ledger(1);
        ledger.stage(dummy_submission("a")).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = ledger.commit_pending_with(&cancel).unwrap_err();

        assert!(matches!(err, LedgerError::Mining(MiningError::Cancelled)));
        assert_eq!(ledger.blocks().len(), 1);
        assert_eq!(ledger.pending_len(), 1);
        assert_eq!(store.write_count(), 1);
    }

    mod on_disk {
        use std::fs;

        use super::*;
        use crate::storage::{JsonFileStore, JsonStoreConfig};

        fn file_config(dir: &std::path::Path) -> LedgerConfig {
            let mut cfg = dummy_config(1);
            cfg.storage = JsonStoreConfig {
                path: dir.join("blockchain_data.json"),
                create_dirs: true,
            };
            cfg
        }

        fn open_file(cfg: &LedgerConfig) -> Ledger<JsonFileStore> {
            Ledger::open(cfg, JsonFileStore::new(&cfg.storage)).expect("open")
        }

        fn quarantined_files(dir: &std::path::Path) -> Vec<String> {
            fs::read_dir(dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with("blockchain_data.json.corrupt-"))
                .collect()
        }

        #[test]
        fn truncated_file_is_replaced_by_a_fresh_genesis() {
            let dir = tempfile::tempdir().unwrap();
            let cfg = file_config(dir.path());
            fs::write(&cfg.storage.path, r#"{"blocks": [{"index": 0, "timest"#).unwrap();

            let ledger = open_file(&cfg);

            assert_eq!(ledger.blocks().len(), 1);
            assert!(ledger.last_block().unwrap().is_genesis());
            assert!(ledger.validate());
            assert_eq!(quarantined_files(dir.path()).len(), 1);

            let reopened = open_file(&cfg);
            assert_eq!(reopened.blocks(), ledger.blocks());
        }

        #[test]
        fn tampered_file_is_replaced_by_a_fresh_genesis() {
            let dir = tempfile::tempdir().unwrap();
            let cfg = file_config(dir.path());
            let mut ledger = open_file(&cfg);
            ledger.stage(dummy_submission("a")).unwrap();
            ledger.commit_pending().unwrap();

            let text = fs::read_to_string(&cfg.storage.path).unwrap();
            fs::write(&cfg.storage.path, text.replace("titulo a", "titulo b")).unwrap();

            let recovered = open_file(&cfg);

            assert_eq!(recovered.blocks().len(), 1);
            assert!(recovered.validate());
            assert_eq!(quarantined_files(dir.path()).len(), 1);
        }

        #[test]
        fn committed_chain_survives_repeated_restarts() {
            let dir = tempfile::tempdir().unwrap();
            let cfg = file_config(dir.path());

            for round in 0..25 {
                let mut ledger = open_file(&cfg);
                assert_eq!(ledger.blocks().len(), round + 1);
                ledger.stage(dummy_submission("a")).unwrap();
                ledger.commit_pending().unwrap();
            }

            let ledger = open_file(&cfg);
            assert_eq!(ledger.blocks().len(), 26);
            assert!(ledger.validate());
            assert!(quarantined_files(dir.path()).is_empty());
        }
    }
}
