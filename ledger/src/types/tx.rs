// ledger/src/types/tx.rs

//! Evidence transaction types.
//!
//! An [`EvidenceTransaction`] is one complaint record. It is created by the
//! ledger when a caller stages an [`EvidenceSubmission`], waits in the
//! pending queue, and becomes immutable once a block commits it. Committed
//! records are read back through [`EvidenceTransactionView`].
//!
//! The serialized field names are the wire format of the chain file and are
//! part of every block fingerprint; do not rename them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::TransactionId;
use super::canonical::{sha256_hex, to_canonical_string};
use crate::chain::error::MalformedBlockError;

/// Descriptive complaint fields supplied by the caller.
///
/// The ledger copies these verbatim; it never interprets them. Absent text
/// fields are stored as `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplaintMetadata {
    pub titulo: Option<String>,
    pub descricao: Option<String>,
    pub conselho: Option<String>,
    pub categoria: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(rename = "ouvidoriaAnonima", default)]
    pub ouvidoria_anonima: bool,
    pub assunto: Option<String>,
    pub prioridade: Option<String>,
    pub finalidade: Option<String>,
    #[serde(rename = "codigosAnteriores")]
    pub codigos_anteriores: Option<String>,
}

/// Everything a caller provides when staging a complaint.
#[derive(Clone, Debug, Default)]
pub struct EvidenceSubmission {
    pub metadata: ComplaintMetadata,
    /// References to attached files; only their digest is recorded.
    pub file_hashes: Vec<String>,
    /// Opaque annotation from an external analyzer. `None` is stored as `{}`.
    pub ia_analysis: Option<Value>,
}

/// Marker serialized as `"type": "evidence_transaction"`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum TransactionKind {
    #[default]
    #[serde(rename = "evidence_transaction")]
    Evidence,
}

/// One staged or committed complaint record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceTransaction {
    pub id: TransactionId,

    #[serde(rename = "type", default)]
    pub kind: TransactionKind,

    /// Staging time, seconds since the Unix epoch.
    pub timestamp: f64,

    /// SHA-256 of the canonical encoding of the submitted file references.
    pub evidence_hash: String,

    pub metadata: ComplaintMetadata,

    #[serde(default = "empty_object")]
    pub ia_analysis: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl EvidenceTransaction {
    /// Builds a transaction from a submission.
    ///
    /// `id` and `timestamp` are assigned by the caller (the ledger), never
    /// by the submitter.
    pub fn from_submission(
        id: TransactionId,
        timestamp: f64,
        submission: EvidenceSubmission,
    ) -> Result<Self, MalformedBlockError> {
        let evidence_hash = evidence_digest(&submission.file_hashes)?;
        Ok(Self {
            id,
            kind: TransactionKind::Evidence,
            timestamp,
            evidence_hash,
            metadata: submission.metadata,
            ia_analysis: submission.ia_analysis.unwrap_or_else(empty_object),
        })
    }
}

/// Digest recorded in `evidence_hash` for a list of file references.
pub fn evidence_digest(file_hashes: &[String]) -> Result<String, MalformedBlockError> {
    let encoded = to_canonical_string(file_hashes)?;
    Ok(sha256_hex(encoded.as_bytes()))
}

/// Read-only, flattened view of a committed transaction.
///
/// Serializes to the record shape served to presentation layers: the id,
/// every metadata field at top level, the raw timestamp, an RFC 3339
/// rendering of it under `data`, the analysis blob and the block index.
#[derive(Clone, Debug, Serialize)]
pub struct EvidenceTransactionView<'a> {
    pub id: &'a TransactionId,
    #[serde(flatten)]
    pub metadata: &'a ComplaintMetadata,
    pub timestamp: f64,
    #[serde(rename = "data")]
    pub recorded_at: String,
    pub ia_analysis: &'a Value,
    pub block_index: u64,
}

impl<'a> EvidenceTransactionView<'a> {
    pub fn new(block_index: u64, tx: &'a EvidenceTransaction) -> Self {
        Self {
            id: &tx.id,
            metadata: &tx.metadata,
            timestamp: tx.timestamp,
            recorded_at: rfc3339_from_epoch(tx.timestamp),
            ia_analysis: &tx.ia_analysis,
            block_index,
        }
    }
}

/// Renders fractional epoch seconds as RFC 3339 (UTC).
///
/// Out-of-range values render as an empty string rather than failing the
/// whole listing.
pub fn rfc3339_from_epoch(seconds: f64) -> String {
    if !seconds.is_finite() {
        return String::new();
    }
    let nanos = (seconds * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_default()
}
