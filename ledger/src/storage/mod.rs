//! Storage backends for the chain.
//!
//! This module provides concrete implementations of the
//! [`crate::chain::store::ChainStore`] trait:
//!
//! - a JSON document store ([`json::JsonFileStore`]) that reads and writes
//!   the `{"blocks": [...]}` chain file,
//! - an in-memory store ([`mem::InMemoryChainStore`]) suitable for tests.

use std::path::PathBuf;

use thiserror::Error;

use crate::chain::error::MalformedBlockError;

pub mod json;
pub mod mem;

pub use json::{JsonFileStore, JsonStoreConfig};
pub use mem::InMemoryChainStore;

/// Storage-level error type.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing has been persisted at `location`.
    #[error("no chain stored at {location}")]
    NotFound { location: String },

    /// Underlying filesystem error.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The chain document is not valid JSON or has the wrong shape.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A block record parsed but its content is unusable.
    #[error("block record {position} is invalid: {reason}")]
    InvalidRecord { position: usize, reason: String },

    /// A block could not be encoded for writing.
    #[error(transparent)]
    Encode(#[from] MalformedBlockError),

    /// The backend refused the write.
    #[error("write rejected by {location}")]
    WriteRejected { location: String },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
