//! # Error Types
//!
//! Errors raised while constructing core primitives. State machine errors
//! live in `germtrace-state`; this crate only rejects malformed identifiers,
//! digests, and timestamps at their construction boundary.

use thiserror::Error;

/// Error constructing a core primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Identifier failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Hex digest could not be parsed.
    #[error("invalid content hash: {0}")]
    InvalidDigest(String),

    /// Timestamp could not be parsed or is out of range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
