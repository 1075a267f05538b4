//! JSON document chain store.
//!
//! The chain is persisted as a single pretty-printed document:
//!
//! ```text
//! {
//!   "blocks": [
//!     {"index": 0, "timestamp": 1700000000.5, "data": "{\"message\": ...}",
//!      "previous_hash": "0", "nonce": 12345, "hash": "0000..."},
//!     ...
//!   ]
//! }
//! ```
//!
//! `data` holds the payload's canonical encoding as a string, which is the
//! exact text that was hashed. On read, an inline JSON object is accepted as
//! well. Writes go to a temporary file that is synced and renamed over the
//! target, so a crash leaves either the old or the new document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::error::MalformedBlockError;
use crate::chain::store::ChainStore;
use crate::types::{Block, BlockHash, Payload};

use super::StorageError;

/// Configuration for [`JsonFileStore`].
#[derive(Clone, Debug)]
pub struct JsonStoreConfig {
    /// Filesystem path of the chain document.
    pub path: PathBuf,
    /// Whether to create missing parent directories on first write.
    pub create_dirs: bool,
}

impl Default for JsonStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/blockchain_data.json"),
            create_dirs: true,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredChain {
    #[serde(default)]
    blocks: Vec<StoredBlock>,
}

#[derive(Serialize, Deserialize)]
struct StoredBlock {
    index: u64,
    timestamp: f64,
    data: StoredData,
    previous_hash: BlockHash,
    nonce: u64,
    hash: BlockHash,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredData {
    Encoded(String),
    Inline(Payload),
}

impl StoredBlock {
    fn from_block(block: &Block) -> Result<Self, MalformedBlockError> {
        Ok(Self {
            index: block.index,
            timestamp: block.timestamp,
            data: StoredData::Encoded(block.payload.canonical_data()?),
            previous_hash: block.previous_hash.clone(),
            nonce: block.nonce,
            hash: block.hash.clone(),
        })
    }

    fn into_block(self, position: usize) -> Result<Block, StorageError> {
        let payload = match self.data {
            StoredData::Inline(payload) => payload,
            StoredData::Encoded(text) => {
                serde_json::from_str(&text).map_err(|e| StorageError::InvalidRecord {
                    position,
                    reason: format!("data is not a block payload: {e}"),
                })?
            }
        };

        Ok(Block {
            index: self.index,
            timestamp: self.timestamp,
            payload,
            previous_hash: self.previous_hash,
            nonce: self.nonce,
            hash: self.hash,
        })
    }
}

/// [`ChainStore`] backed by one JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    create_dirs: bool,
}

impl JsonFileStore {
    /// Creates a store for the file at `cfg.path`. Nothing is touched until
    /// the first load or save.
    pub fn new(cfg: &JsonStoreConfig) -> Self {
        Self {
            path: cfg.path.clone(),
            create_dirs: cfg.create_dirs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl ChainStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<Block>>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let stored: StoredChain =
            serde_json::from_str(&text).map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let blocks = stored
            .blocks
            .into_iter()
            .enumerate()
            .map(|(position, record)| record.into_block(position))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(path = %self.path.display(), blocks = blocks.len(), "chain document read");
        Ok(Some(blocks))
    }

    fn save(&mut self, chain: &[Block]) -> Result<(), StorageError> {
        let stored = StoredChain {
            blocks: chain
                .iter()
                .map(StoredBlock::from_block)
                .collect::<Result<Vec<_>, _>>()?,
        };
        let content = serde_json::to_vec_pretty(&stored).map_err(MalformedBlockError::from)?;

        let parent = self.parent_dir();
        if self.create_dirs {
            fs::create_dir_all(&parent).map_err(|e| StorageError::io(&parent, e))?;
        }
        atomic_write(&self.path, &parent, &content).map_err(|e| StorageError::io(&self.path, e))?;

        debug!(path = %self.path.display(), blocks = chain.len(), "chain document written");
        Ok(())
    }

    fn quarantine(&mut self) -> Result<Option<String>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chain".to_string());
        let target = self.parent_dir().join(format!("{file_name}.corrupt-{seconds}"));

        fs::rename(&self.path, &target).map_err(|e| StorageError::io(&self.path, e))?;
        Ok(Some(target.display().to_string()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Writes `content` to `target` through a synced temporary sibling file.
fn atomic_write(target: &Path, parent: &Path, content: &[u8]) -> std::io::Result<()> {
    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        std::process::id()
    ));

    {
        let mut f = fs::File::create(&temp_path)?;
        f.write_all(content)?;
        f.sync_all()?;
    }

    if let Err(e) = fs::rename(&temp_path, target) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    // Make the rename itself durable.
    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::chain::miner::mine;
    use crate::chain::validator::verify_chain;
    use crate::types::{Difficulty, EvidenceSubmission, EvidenceTransaction, GenesisMarker, TransactionId};

    /// Genesis block as written by the earlier service at difficulty 0.
    const LEGACY_DOCUMENT: &str = r#"{
  "blocks": [
    {
      "index": 0,
      "timestamp": 1700000000.5,
      "data": "{\"message\": \"EviChain Genesis Block\", \"type\": \"genesis\", \"version\": \"1.0.0\"}",
      "previous_hash": "0",
      "nonce": 0,
      "hash": "35179258630f091ca86508845dca2f30411afd4627331aff8664052505a0a470"
    }
  ]
}"#;

    fn store_in(dir: &Path) -> JsonFileStore {
        JsonFileStore::new(&JsonStoreConfig {
            path: dir.join("data").join("blockchain_data.json"),
            create_dirs: true,
        })
    }

    fn dummy_chain() -> Vec<Block> {
        let difficulty = Difficulty::new(1).unwrap();
        let genesis = mine(
            Block::genesis(1_700_000_000.25, GenesisMarker::default()).unwrap(),
            difficulty,
        )
        .unwrap();

        let mut submission = EvidenceSubmission::default();
        submission.metadata.titulo = Some("Denúncia".into());
        submission.metadata.descricao = Some("médico ausente".into());
        submission.file_hashes = vec!["hash1".into()];
        let tx = EvidenceTransaction::from_submission(
            TransactionId("EVC-2023-1".into()),
            1_700_000_001.0,
            submission,
        )
        .unwrap();

        let next = Block::new(
            1,
            1_700_000_002.0,
            Payload::Transactions {
                transactions: vec![tx],
            },
            genesis.hash.clone(),
        )
        .unwrap();
        let next = mine(next, difficulty).unwrap();
        vec![genesis, next]
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(dir.path()).load().unwrap().is_none());
    }

    #[test]
    fn saved_chain_loads_back_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        let chain = dummy_chain();

        store.save(&chain).unwrap();
        let loaded = store.load().unwrap().expect("chain");

        assert_eq!(loaded, chain);
        assert!(verify_chain(&loaded).is_ok());
    }

    #[test]
    fn nanosecond_timestamps_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());

        // Same construction as a wall-clock reading: whole seconds plus
        // nanoseconds / 1e9.
        let stamp = |i: u64| {
            let secs = 1_760_000_000 + i * 37;
            let nanos = (i * 7_919_423 + 12_345) % 1_000_000_000;
            Duration::new(secs, nanos as u32).as_secs_f64()
        };

        let mut chain = Vec::new();
        let mut previous = BlockHash::genesis_parent();
        for i in 0..4_000u64 {
            let tx = EvidenceTransaction::from_submission(
                TransactionId(format!("EVC-2025-{i}")),
                stamp(i + 1_000_000),
                EvidenceSubmission::default(),
            )
            .unwrap();
            let block = Block::new(
                i,
                stamp(i),
                Payload::Transactions {
                    transactions: vec![tx],
                },
                previous,
            )
            .unwrap();
            previous = block.hash.clone();
            chain.push(block);
        }

        store.save(&chain).unwrap();
        let loaded = store.load().unwrap().expect("chain");
        assert_eq!(loaded.len(), chain.len());

        for (before, after) in chain.iter().zip(&loaded) {
            assert_eq!(before.timestamp.to_bits(), after.timestamp.to_bits());
            assert_eq!(
                before.transactions()[0].timestamp.to_bits(),
                after.transactions()[0].timestamp.to_bits()
            );
            assert!(after.has_valid_hash().unwrap(), "block {}", after.index);
        }
    }

    #[test]
    fn data_is_persisted_as_canonical_string() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        let chain = dummy_chain();
        store.save(&chain).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        let data = doc["blocks"][1]["data"].as_str().expect("data is a string");

        assert_eq!(data, chain[1].payload.canonical_data().unwrap());
        assert!(data.contains("\\u00e9"));
        assert!(text.starts_with("{\n  \"blocks\": ["));
    }

    #[test]
    fn legacy_document_loads_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), LEGACY_DOCUMENT).unwrap();

        let loaded = store.load().unwrap().expect("chain");

        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].is_genesis());
        assert!(verify_chain(&loaded).is_ok());
    }

    #[test]
    fn inline_data_object_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        let inline = LEGACY_DOCUMENT.replace(
            r#""{\"message\": \"EviChain Genesis Block\", \"type\": \"genesis\", \"version\": \"1.0.0\"}""#,
            r#"{"type": "genesis", "message": "EviChain Genesis Block", "version": "1.0.0"}"#,
        );
        fs::write(store.path(), inline).unwrap();

        let loaded = store.load().unwrap().expect("chain");

        assert!(verify_chain(&loaded).is_ok());
    }

    #[test]
    fn document_without_blocks_is_an_empty_chain() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{}").unwrap();

        assert_eq!(store.load().unwrap(), Some(Vec::new()));
    }

    #[test]
    fn truncated_document_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), &LEGACY_DOCUMENT[..40]).unwrap();

        assert!(matches!(store.load(), Err(StorageError::Parse { .. })));
    }

    #[test]
    fn undecodable_data_string_is_an_invalid_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        let broken = LEGACY_DOCUMENT.replace(r#""data": "{"#, r#""data": "{{"#);
        fs::write(store.path(), broken).unwrap();

        assert!(matches!(
            store.load(),
            Err(StorageError::InvalidRecord { position: 0, .. })
        ));
    }

    #[test]
    fn save_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store.save(&dummy_chain()).unwrap();
        store.save(&dummy_chain()).unwrap();

        let names: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["blockchain_data.json".to_string()]);
    }

    #[test]
    fn quarantine_moves_the_document_aside() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        assert!(store.quarantine().unwrap().is_none());

        store.save(&dummy_chain()).unwrap();
        let moved = store.quarantine().unwrap().expect("quarantined");

        assert!(moved.contains("blockchain_data.json.corrupt-"));
        assert!(Path::new(&moved).exists());
        assert!(store.load().unwrap().is_none());
    }
}
