//! # Ledger Adapter
//!
//! The boundary between the lifecycle state machine and the replicated,
//! versioned key-value store that holds records. The state machine treats
//! values as opaque bytes and never sees how they are replicated or ordered.
//!
//! ## Contract
//!
//! - `get_state` / `put_state` / `del_state`: point access by key.
//! - `state_by_range`: live keys in `[start, end)` in lexicographic order.
//!   An empty `start` or `end` leaves that side unbounded.
//! - `history_for_key`: every modification of a key, oldest first, with
//!   deletions as tombstones.
//! - `tx_meta`: id and timestamp of the transaction the caller runs in.
//!   This is the only clock the state machine may read.
//!
//! Implementations are responsible for serializing concurrent writers and
//! may abort a transaction with [`LedgerError::Conflict`].

mod file;
mod memory;

pub use file::FileLedger;
pub use memory::MemoryLedger;

use germtrace_core::{Timestamp, TxId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a ledger implementation.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Concurrency control aborted the transaction.
    #[error("write conflict on key {key}; transaction aborted")]
    Conflict {
        /// Key whose version moved under the transaction.
        key: String,
    },

    /// A write was attempted outside a transaction.
    #[error("no transaction in progress")]
    NoTransaction,

    /// Implementation-specific failure.
    #[error("ledger backend error: {0}")]
    Backend(String),

    /// Persistent storage failed.
    #[error("ledger io error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistent storage held an undecodable document.
    #[error("ledger encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Identity and timestamp of the transaction an operation executes in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMeta {
    /// Transaction id assigned by the ledger.
    pub tx_id: TxId,
    /// Transaction timestamp assigned by the ledger.
    pub timestamp: Timestamp,
}

impl TxMeta {
    /// Build transaction metadata from explicit parts.
    pub fn new(tx_id: TxId, timestamp: Timestamp) -> Self {
        Self { tx_id, timestamp }
    }

    /// Fresh metadata with a random id and the current time.
    ///
    /// For ledger front-ends that open transactions, never for lifecycle code.
    pub fn generate() -> Self {
        Self::new(TxId::generate(), Timestamp::now())
    }
}

/// One modification in a key's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Transaction that made the modification.
    pub tx_id: TxId,
    /// Timestamp of that transaction.
    pub timestamp: Timestamp,
    /// Value written, or `None` when the key was deleted.
    #[serde(with = "utf8_bytes")]
    pub value: Option<Vec<u8>>,
}

impl HistoryEntry {
    /// Whether this entry records a deletion.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// Versioned key-value store consumed by the lifecycle state machine.
pub trait Ledger {
    /// Current value of `key`, or `None` if absent or deleted.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write `value` under `key` in the current transaction.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Delete `key` in the current transaction.
    fn del_state(&mut self, key: &str) -> Result<(), LedgerError>;

    /// Live entries with `start <= key < end`, ordered by key.
    fn state_by_range(&self, start: &str, end: &str)
        -> Result<Vec<(String, Vec<u8>)>, LedgerError>;

    /// All modifications of `key`, oldest first.
    fn history_for_key(&self, key: &str) -> Result<Vec<HistoryEntry>, LedgerError>;

    /// Metadata of the transaction in progress.
    fn tx_meta(&self) -> Result<&TxMeta, LedgerError>;
}

/// Stores record bytes as text so persisted ledgers stay human-readable.
///
/// Values written by the state machine are JSON and therefore UTF-8; any
/// other value is refused at save time rather than silently mangled.
mod utf8_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(serde::ser::Error::custom)?;
                s.serialize_some(text)
            }
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Ok(Option::<String>::deserialize(d)?.map(String::into_bytes))
    }
}
