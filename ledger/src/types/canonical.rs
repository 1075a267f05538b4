// ledger/src/types/canonical.rs

//! Canonical JSON encoding.
//!
//! Every hash in the ledger is taken over a canonical byte string, so the
//! encoding here is the single source of truth for fingerprints. The rules
//! are:
//!
//! - object keys are sorted (recursively, at every nesting level),
//! - items are separated by `", "` and keys from values by `": "`,
//! - every character outside printable ASCII is written as a lowercase
//!   `\uXXXX` escape (UTF-16 code units for astral characters).
//!
//! This is exactly the form the complaint service has always hashed, so a
//! chain file written by any earlier deployment verifies byte-for-byte.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::chain::error::MalformedBlockError;

/// `serde_json` formatter producing the canonical separators and escapes.
///
/// Key ordering is *not* handled here; callers either go through
/// [`canonicalize`] first or serialize structs whose fields are declared in
/// sorted order.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        // Quotes, backslashes and C0 controls never reach this method; they
        // are routed through `write_char_escape`.
        if fragment.bytes().all(|b| (b' '..=b'~').contains(&b)) {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Returns `value` with every object's keys re-inserted in sorted order.
///
/// The rebuild is explicit so the result does not depend on whether
/// `serde_json` was compiled with `preserve_order`.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serializes `value` with the canonical formatter, preserving the
/// serializer's own field order.
///
/// Only use this directly for types whose field order is already canonical
/// (see `BlockPreimage`); everything else should go through
/// [`to_canonical_string`].
pub fn write_canonical<T>(value: &T) -> Result<String, MalformedBlockError>
where
    T: Serialize + ?Sized,
{
    let mut buf = Vec::with_capacity(256);
    let mut ser = Serializer::with_formatter(&mut buf, CanonicalFormatter);
    value.serialize(&mut ser).map_err(MalformedBlockError::from)?;
    // The formatter only ever emits ASCII.
    String::from_utf8(buf).map_err(|e| MalformedBlockError::new(e.to_string()))
}

/// Encodes any serializable value into its canonical string.
///
/// Fails with [`MalformedBlockError`] if the value cannot be represented as
/// JSON (e.g. a map keyed by non-strings).
pub fn to_canonical_string<T>(value: &T) -> Result<String, MalformedBlockError>
where
    T: Serialize + ?Sized,
{
    let tree = serde_json::to_value(value).map_err(MalformedBlockError::from)?;
    write_canonical(&canonicalize(tree))
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
