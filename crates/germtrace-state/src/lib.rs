//! # germtrace-state: Specimen Lifecycle State Machine
//!
//! Governs the traceability record of a germplasm specimen as it moves
//! through a multi-party approval pipeline:
//!
//! ```text
//! Collected ──save──▶ Saved ──enter──▶ Entered ──share──▶ Shared ──commit──▶ (locked)
//! ```
//!
//! Each stage writes a fixed-shape payload stamped with a content hash.
//! Reviewers may reject the current stage (setting `disputed`), and any
//! stage may be corrected by its modify operation until the record is
//! committed, after which only an administrative purge can touch it.
//!
//! ## Modules
//!
//! - [`stage`]: the four pipeline stages.
//! - [`payload`]: positional argument binding and content hashing.
//! - [`record`]: the stored aggregate and its pure transition rules.
//! - [`ledger`]: the versioned key-value store boundary, with in-memory and
//!   file-backed implementations.
//! - [`lifecycle`]: one function per operation over an explicit ledger.
//! - [`history`]: lazy reconstruction of a record's versions.
//! - [`dispatch`]: string-typed operation routing for ledger clients.
//!
//! ## Design
//!
//! The ledger is passed into every operation; nothing here holds global
//! state, reads a clock, or generates randomness. Every mutation is one
//! whole-record read-modify-write, so an operation either lands completely
//! or returns an error having written nothing.

pub mod dispatch;
pub mod error;
pub mod history;
pub mod ledger;
pub mod lifecycle;
pub mod operation;
pub mod payload;
pub mod record;
pub mod stage;

pub use dispatch::{dispatch, Response};
pub use error::LifecycleError;
pub use history::{RecordHistory, RecordVersion};
pub use ledger::{FileLedger, HistoryEntry, Ledger, LedgerError, MemoryLedger, TxMeta};
pub use operation::{Operation, UnknownOperation};
pub use payload::{
    field_count, field_names, CertificationInfo, CollectionInfo, PreservationInfo, SharingInfo,
    StagePayload,
};
pub use record::{IntegrityFinding, IntegrityReport, PayloadSlot, Record};
pub use stage::{Stage, UnknownStage};
