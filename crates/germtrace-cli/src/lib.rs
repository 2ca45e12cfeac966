//! # germtrace-cli: Operator Command Line
//!
//! Provides the `germtrace` binary over a file-backed ledger. Each
//! invocation is one transaction: mutations are committed to the ledger file
//! only when the operation succeeds.
//!
//! ## Subcommands
//!
//! - `germtrace invoke` runs any lifecycle operation by name.
//! - `germtrace read` / `range` / `history` read records.
//! - `germtrace audit` recomputes stage content hashes.
//! - `germtrace fields` prints a stage's positional field order.
//!
//! ```bash
//! germtrace --ledger ledger.json invoke create A --args-file collection.json
//! germtrace --ledger ledger.json invoke commit A
//! germtrace --ledger ledger.json history A
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

pub mod config;
pub mod invoke;
pub mod query;

use anyhow::Result;
use serde::Serialize;

/// Write `value` to stdout as pretty-printed JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
