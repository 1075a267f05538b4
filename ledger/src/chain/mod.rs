//! Chain maintenance: mining, verification, persistence seam and the ledger.
//!
//! This module contains:
//!
//! - configuration for mining and load recovery (`config`),
//! - error types (`error`),
//! - the proof-of-work search (`miner`),
//! - chain verification (`validator`),
//! - the storage trait the ledger persists through (`store`),
//! - transaction id issuance (`ids`),
//! - the [`Ledger`] itself and its thread-safe [`SharedLedger`] handle.

pub mod config;
pub mod error;
pub mod handle;
pub mod ids;
pub mod ledger;
pub mod miner;
pub mod store;
pub mod validator;

pub use config::{MiningConfig, RecoveryConfig, RecoveryPolicy};
pub use error::{ChainFault, LedgerError, MalformedBlockError, MiningError};
pub use handle::{SharedLedger, Submitted};
pub use ids::IdGenerator;
pub use ledger::{ChainSummary, Ledger};
pub use miner::{CancelToken, Miner, mine};
pub use store::ChainStore;
pub use validator::verify_chain;
