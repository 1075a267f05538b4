//! Transaction identifier generation.
//!
//! Ids look like `EVC-2025-482113`: the calendar year followed by the Unix
//! time in seconds modulo 1 000 000. The seconds part wraps roughly every
//! eleven days, so the generator remembers every id it has handed out (and
//! every id already committed, see [`IdGenerator::reserve`]). A base id that
//! is already taken gets a `-2`, `-3`, ... suffix.

use std::collections::HashSet;

use time::OffsetDateTime;

use crate::types::TransactionId;

#[derive(Debug, Default)]
pub struct IdGenerator {
    issued: HashSet<String>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks ids as taken, e.g. the ones found in a loaded chain.
    pub fn reserve<'a>(&mut self, ids: impl IntoIterator<Item = &'a TransactionId>) {
        self.issued
            .extend(ids.into_iter().map(|id| id.as_str().to_string()));
    }

    /// Issues the id for a transaction staged at `now`.
    pub fn next_id(&mut self, now: OffsetDateTime) -> TransactionId {
        let base = format!("EVC-{}-{}", now.year(), now.unix_timestamp().rem_euclid(1_000_000));

        let mut candidate = base.clone();
        let mut n = 1u32;
        while self.issued.contains(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }

        self.issued.insert(candidate.clone());
        TransactionId(candidate)
    }
}
