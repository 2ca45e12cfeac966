//! # Lifecycle Errors
//!
//! Every failure a lifecycle operation can report to its caller. None of
//! these are retried or recovered locally; the ledger that dispatched the
//! transaction owns retry and abort policy. An operation that returns an
//! error has written nothing.

use germtrace_core::CoreError;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::operation::Operation;
use crate::stage::Stage;

/// Error returned by a lifecycle, read, or dispatch operation.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// No record is stored under the id.
    #[error("record {id} does not exist")]
    NotFound {
        /// The missing record id.
        id: String,
    },

    /// Create was called for an id that is already stored.
    #[error("record {id} already exists")]
    AlreadyExists {
        /// The existing record id.
        id: String,
    },

    /// The caller supplied the wrong number of positional arguments.
    #[error("{target} expects {expected} arguments, got {actual}")]
    InvalidArgumentCount {
        /// What the arguments were for (a stage payload or an operation).
        target: String,
        /// Declared argument count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// An advance or reject was attempted from the wrong stage.
    #[error("invalid state transition for {operation}: expected {expected}, got {actual}")]
    InvalidStateTransition {
        /// The rejected operation.
        operation: Operation,
        /// The stage the operation requires.
        expected: Stage,
        /// The stage the record is in.
        actual: Stage,
    },

    /// The record is locked and accepts no further mutation.
    #[error("cannot {operation} record {id}: already finalized")]
    AlreadyFinalized {
        /// The locked record id.
        id: String,
        /// The rejected operation.
        operation: Operation,
    },

    /// Stored bytes could not be decoded into a record.
    #[error("record {id} is corrupt: {source}")]
    CorruptRecord {
        /// Key of the undecodable value.
        id: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },

    /// The caller supplied a malformed record id.
    #[error(transparent)]
    InvalidId(#[from] CoreError),

    /// The ledger failed to serve a read or accept a write.
    #[error("storage error: {0}")]
    Storage(#[from] LedgerError),
}

impl LifecycleError {
    /// Whether the ledger aborted the transaction on a write conflict.
    ///
    /// A conflict is the one failure a caller may sensibly resubmit.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Storage(LedgerError::Conflict { .. }))
    }
}
