//! # germtrace-core: Foundational Types for Germplasm Traceability
//!
//! Leaf crate of the workspace. Defines the primitives every other crate
//! builds on: the stage content hash, identifier newtypes, and the UTC
//! transaction timestamp.
//!
//! ## Key Design Principles
//!
//! 1. **One hashing path.** Every stage payload fingerprint is produced by
//!    [`content_hash()`]. The hash is SHA-256 over the ordered fields joined
//!    with no separator, matching hashes already stored on the ledger.
//!
//! 2. **Newtype identifiers.** `RecordId` and `TxId` are distinct types; a
//!    transaction id cannot be passed where a record key is expected.
//!
//! 3. **No ambient clock in the state machine.** `Timestamp::now()` exists
//!    for ledger implementations. Lifecycle code only ever receives the
//!    timestamp of the transaction it runs in, so replay on every peer yields
//!    identical records.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `germtrace-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use digest::{content_hash, ContentHash};
pub use error::CoreError;
pub use identity::{RecordId, TxId};
pub use temporal::Timestamp;
