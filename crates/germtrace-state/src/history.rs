//! # Record History
//!
//! Decodes a key's modification log into record snapshots one entry at a
//! time. Deleted versions surface as tombstone records (`deleted: true`)
//! carrying only the id, so a reader can tell "deleted here" apart from a
//! gap in the log.

use std::iter::FusedIterator;

use germtrace_core::{RecordId, Timestamp, TxId};
use serde::Serialize;

use crate::error::LifecycleError;
use crate::ledger::HistoryEntry;
use crate::record::Record;

/// One version of a record together with the transaction that wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordVersion {
    pub tx_id: TxId,
    pub timestamp: Timestamp,
    pub record: Record,
}

/// Oldest-first iterator over every version of one record.
///
/// Consumes the log it was built from; call
/// [`crate::lifecycle::read_history()`] again to restart.
#[derive(Debug)]
pub struct RecordHistory {
    id: RecordId,
    entries: std::vec::IntoIter<HistoryEntry>,
}

impl RecordHistory {
    pub(crate) fn new(id: RecordId, entries: Vec<HistoryEntry>) -> Self {
        Self {
            id,
            entries: entries.into_iter(),
        }
    }

    /// The record id this history belongs to.
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Yield versions with their transaction metadata instead of bare records.
    pub fn versions(self) -> impl Iterator<Item = Result<RecordVersion, LifecycleError>> {
        let id = self.id;
        self.entries.map(move |entry| {
            let record = decode(&id, entry.value.as_deref())?;
            Ok(RecordVersion {
                tx_id: entry.tx_id,
                timestamp: entry.timestamp,
                record,
            })
        })
    }
}

fn decode(id: &RecordId, value: Option<&[u8]>) -> Result<Record, LifecycleError> {
    match value {
        Some(bytes) => Record::from_bytes(id.as_str(), bytes),
        None => Ok(Record::tombstone(id.clone())),
    }
}

impl Iterator for RecordHistory {
    type Item = Result<Record, LifecycleError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(decode(&self.id, entry.value.as_deref()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for RecordHistory {}

impl FusedIterator for RecordHistory {}
