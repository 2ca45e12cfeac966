//! # Invoke Subcommand
//!
//! Runs one lifecycle operation as one ledger transaction: open the ledger
//! file, begin a transaction with a fresh id and the current time, dispatch,
//! and commit only if the operation succeeded.
//!
//! ```bash
//! germtrace invoke create A --args-file collection.json
//! germtrace invoke save A p1 p2 ... p14
//! germtrace invoke reject-save A
//! germtrace invoke LoadFruitInfo A
//! germtrace invoke modify-share A -- -1 ...
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use germtrace_core::{Timestamp, TxId};
use germtrace_state::{dispatch, FileLedger, Operation, Response, TxMeta};

use crate::print_json;

/// Arguments for `germtrace invoke`.
#[derive(Args, Debug)]
pub struct InvokeArgs {
    /// Operation name (`create`, `modify-save`, `commit`, ...) or its
    /// chaincode alias (`CreateFruitInfo`, ...).
    pub operation: String,

    /// Positional arguments: the record id first, then payload fields.
    /// Put values starting with `-` after `--` or in `--args-file`.
    pub args: Vec<String>,

    /// JSON array of strings appended after the positional arguments.
    #[arg(long)]
    pub args_file: Option<PathBuf>,
}

/// Execute the invoke subcommand against the ledger at `ledger_path`.
pub fn run_invoke(args: &InvokeArgs, ledger_path: &Path) -> Result<u8> {
    let operation: Operation = args.operation.parse()?;
    let mut call_args = args.args.clone();
    if let Some(file) = &args.args_file {
        call_args.extend(read_args_file(file)?);
    }

    let response = invoke(ledger_path, operation, &call_args)?;
    print_json(&response)?;
    Ok(0)
}

/// Dispatch `operation` in a fresh transaction and commit on success.
///
/// Read-only operations never rewrite the ledger file.
pub fn invoke(ledger_path: &Path, operation: Operation, args: &[String]) -> Result<Response> {
    let mut ledger = FileLedger::open(ledger_path)
        .with_context(|| format!("opening ledger: {}", ledger_path.display()))?;
    let meta = TxMeta::new(TxId::generate(), Timestamp::now());
    tracing::debug!(op = %operation, tx_id = %meta.tx_id, "transaction started");
    ledger.begin(meta);

    let response =
        dispatch(&mut ledger, operation, args).with_context(|| format!("{operation} failed"))?;

    if operation.is_mutation() {
        ledger
            .commit()
            .with_context(|| format!("committing ledger: {}", ledger_path.display()))?;
    }
    Ok(response)
}

fn read_args_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading args file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} must be a JSON array of strings", path.display()))
}
