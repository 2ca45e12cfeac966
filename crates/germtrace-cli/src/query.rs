//! # Query Subcommands
//!
//! Read-only views over the ledger file. None of these open a transaction,
//! so none of them can rewrite the ledger.
//!
//! - `read` prints the current snapshot of one record.
//! - `range` prints every live record in `[start, end)`.
//! - `history` prints every version of a record with its transaction.
//! - `audit` recomputes stage content hashes and reports mismatches.
//! - `fields` prints the positional field order of a stage payload.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use germtrace_state::{field_names, lifecycle, FileLedger, IntegrityReport, RecordVersion, Stage};

use crate::print_json;

/// Arguments for `germtrace read`.
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Record id.
    pub id: String,
}

/// Arguments for `germtrace range`.
#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Inclusive lower bound; omit for unbounded.
    #[arg(long, default_value = "")]
    pub start: String,
    /// Exclusive upper bound; omit for unbounded.
    #[arg(long, default_value = "")]
    pub end: String,
}

/// Arguments for `germtrace history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Record id.
    pub id: String,
}

/// Arguments for `germtrace audit`.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Record id; every live record when omitted.
    pub id: Option<String>,
}

/// Arguments for `germtrace fields`.
#[derive(Args, Debug)]
pub struct FieldsArgs {
    /// Stage name (`collected`, `save`, `2`, ...).
    pub stage: String,
}

#[derive(Serialize)]
struct FieldListing {
    stage: Stage,
    count: usize,
    fields: Vec<&'static str>,
}

fn open(ledger_path: &Path) -> Result<FileLedger> {
    FileLedger::open(ledger_path)
        .with_context(|| format!("opening ledger: {}", ledger_path.display()))
}

/// Execute `germtrace read`.
pub fn run_read(args: &ReadArgs, ledger_path: &Path) -> Result<u8> {
    let ledger = open(ledger_path)?;
    let record = lifecycle::read(&ledger, &args.id)?;
    print_json(&record)?;
    Ok(0)
}

/// Execute `germtrace range`.
pub fn run_range(args: &RangeArgs, ledger_path: &Path) -> Result<u8> {
    let ledger = open(ledger_path)?;
    let records = lifecycle::read_range(&ledger, &args.start, &args.end)?;
    tracing::info!(count = records.len(), "range read");
    print_json(&records)?;
    Ok(0)
}

/// Execute `germtrace history`.
pub fn run_history(args: &HistoryArgs, ledger_path: &Path) -> Result<u8> {
    let ledger = open(ledger_path)?;
    let versions: Vec<RecordVersion> = lifecycle::read_history(&ledger, &args.id)?
        .versions()
        .collect::<Result<_, _>>()?;
    print_json(&versions)?;
    Ok(0)
}

/// Execute `germtrace audit`. Exits 1 if any stored hash does not match.
pub fn run_audit(args: &AuditArgs, ledger_path: &Path) -> Result<u8> {
    let reports = audit(args.id.as_deref(), ledger_path)?;
    print_json(&reports)?;

    let tampered: Vec<&IntegrityReport> = reports.iter().filter(|r| !r.is_intact()).collect();
    if tampered.is_empty() {
        return Ok(0);
    }
    for report in &tampered {
        tracing::error!(record_id = %report.id, stages = ?report.tampered_stages(), "content hash mismatch");
    }
    Ok(1)
}

fn audit(id: Option<&str>, ledger_path: &Path) -> Result<Vec<IntegrityReport>> {
    let ledger = open(ledger_path)?;
    let records = match id {
        Some(id) => vec![lifecycle::read(&ledger, id)?],
        None => lifecycle::read_range(&ledger, "", "")?,
    };
    Ok(records.iter().map(|r| r.audit()).collect())
}

/// Execute `germtrace fields`.
pub fn run_fields(args: &FieldsArgs) -> Result<u8> {
    let stage: Stage = args.stage.parse()?;
    let fields = field_names(stage).to_vec();
    print_json(&FieldListing {
        stage,
        count: fields.len(),
        fields,
    })?;
    Ok(0)
}
