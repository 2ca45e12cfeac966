//! # In-Memory Ledger
//!
//! A versioned world state held in a `BTreeMap` of per-key modification
//! logs. The latest entry of a log is the key's current value; a trailing
//! tombstone means the key is deleted. Used directly by tests and as the
//! working set behind [`super::FileLedger`].

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use germtrace_core::{Timestamp, TxId};
use serde::{Deserialize, Serialize};

use super::{HistoryEntry, Ledger, LedgerError, TxMeta};

/// Timestamp of the first transaction opened with [`MemoryLedger::begin_next()`].
const SEQUENCE_EPOCH_SECS: i64 = 1_767_225_600; // 2026-01-01T00:00:00Z

/// Versioned in-memory world state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLedger {
    keys: BTreeMap<String, Vec<HistoryEntry>>,
    #[serde(default)]
    sequence: u64,
    #[serde(skip)]
    current: Option<TxMeta>,
    #[serde(skip)]
    pending_conflicts: BTreeSet<String>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a transaction with metadata supplied by the caller.
    pub fn begin(&mut self, meta: TxMeta) {
        self.sequence += 1;
        self.current = Some(meta);
    }

    /// Open a transaction with a deterministic, sequence-numbered id and a
    /// timestamp one second after the previous sequenced transaction.
    pub fn begin_next(&mut self) -> Result<TxMeta, LedgerError> {
        let seq = self.sequence + 1;
        let secs = i64::try_from(seq)
            .ok()
            .and_then(|s| SEQUENCE_EPOCH_SECS.checked_add(s))
            .ok_or_else(|| LedgerError::Backend(format!("sequence {seq} out of range")))?;
        let timestamp =
            Timestamp::from_epoch_secs(secs).map_err(|e| LedgerError::Backend(e.to_string()))?;
        let meta = TxMeta::new(TxId::new(format!("tx-{seq:06}")), timestamp);
        self.begin(meta.clone());
        Ok(meta)
    }

    /// Make the next write to `key` fail with [`LedgerError::Conflict`].
    ///
    /// Simulates a concurrent transaction committing first.
    pub fn inject_conflict(&mut self, key: impl Into<String>) {
        self.pending_conflicts.insert(key.into());
    }

    /// Number of transactions opened so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of live keys.
    pub fn live_count(&self) -> usize {
        self.keys.values().filter(|log| current_value(log).is_some()).count()
    }

    fn append(&mut self, key: &str, value: Option<Vec<u8>>) -> Result<(), LedgerError> {
        if self.pending_conflicts.remove(key) {
            tracing::debug!(key, "injected write conflict");
            return Err(LedgerError::Conflict {
                key: key.to_string(),
            });
        }
        let meta = self.current.clone().ok_or(LedgerError::NoTransaction)?;
        self.keys.entry(key.to_string()).or_default().push(HistoryEntry {
            tx_id: meta.tx_id,
            timestamp: meta.timestamp,
            value,
        });
        Ok(())
    }
}

fn current_value(log: &[HistoryEntry]) -> Option<&Vec<u8>> {
    log.last().and_then(|entry| entry.value.as_ref())
}

impl Ledger for MemoryLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.keys.get(key).and_then(|log| current_value(log)).cloned())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        tracing::debug!(key, bytes = value.len(), "put state");
        self.append(key, Some(value))
    }

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError> {
        if self.get_state(key)?.is_none() {
            return Ok(());
        }
        tracing::debug!(key, "delete state");
        self.append(key, None)
    }

    fn state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        if !start.is_empty() && !end.is_empty() && start >= end {
            return Ok(Vec::new());
        }
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        Ok(self
            .keys
            .range::<str, _>((lower, upper))
            .filter_map(|(key, log)| current_value(log).map(|v| (key.clone(), v.clone())))
            .collect())
    }

    fn history_for_key(&self, key: &str) -> Result<Vec<HistoryEntry>, LedgerError> {
        Ok(self.keys.get(key).cloned().unwrap_or_default())
    }

    fn tx_meta(&self) -> Result<&TxMeta, LedgerError> {
        self.current.as_ref().ok_or(LedgerError::NoTransaction)
    }
}
