//! # Lifecycle State Machine
//!
//! One free function per operation. Each takes the ledger as an explicit
//! storage context, loads the record once, applies one [`Record`] transition
//! in memory, and writes the whole record back at most once.
//!
//! ## Check Order
//!
//! 1. Record id is well formed.
//! 2. Payload arity (payload operations only).
//! 3. Presence: `NotFound`, or `AlreadyExists` for create.
//! 4. Lock: `AlreadyFinalized` (every mutation except admin purge).
//! 5. Stage precondition: `InvalidStateTransition` (advance, reject, commit).
//!
//! The first failing check wins and nothing is written.
//!
//! ## Security Invariant
//!
//! No function here reads a clock or generates randomness. Rejection and
//! commit metadata come from [`Ledger::tx_meta()`], so replaying the same
//! transaction on every ledger peer yields byte-identical records.

use germtrace_core::RecordId;

use crate::error::LifecycleError;
use crate::history::RecordHistory;
use crate::ledger::Ledger;
use crate::operation::Operation;
use crate::payload::{
    CertificationInfo, CollectionInfo, PreservationInfo, SharingInfo, StagePayload,
};
use crate::record::{PayloadSlot, Record};
use crate::stage::Stage;

// ─── Reads ──────────────────────────────────────────────────────────

/// Whether a live record is stored under `id`.
pub fn exists<L: Ledger + ?Sized>(ledger: &L, id: &str) -> Result<bool, LifecycleError> {
    let id = RecordId::new(id)?;
    Ok(ledger.get_state(id.as_str())?.is_some())
}

/// The current snapshot of a record.
pub fn read<L: Ledger + ?Sized>(ledger: &L, id: &str) -> Result<Record, LifecycleError> {
    let id = RecordId::new(id)?;
    load(ledger, &id)
}

/// Every live record with `start <= id < end`, in id order.
///
/// An empty bound leaves that side open.
pub fn read_range<L: Ledger + ?Sized>(
    ledger: &L,
    start: &str,
    end: &str,
) -> Result<Vec<Record>, LifecycleError> {
    ledger
        .state_by_range(start, end)?
        .into_iter()
        .map(|(key, bytes)| Record::from_bytes(&key, &bytes))
        .collect()
}

/// Every version of a record, oldest first.
///
/// A key that was never written yields an empty history rather than
/// `NotFound`, so the history of a purged record stays readable.
pub fn read_history<L: Ledger + ?Sized>(
    ledger: &L,
    id: &str,
) -> Result<RecordHistory, LifecycleError> {
    let id = RecordId::new(id)?;
    let entries = ledger.history_for_key(id.as_str())?;
    tracing::debug!(record_id = %id, versions = entries.len(), "history loaded");
    Ok(RecordHistory::new(id, entries))
}

// ─── Collection ─────────────────────────────────────────────────────

/// Create a record at `Collected` from 29 collection fields.
pub fn create<L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    args: &[String],
) -> Result<Record, LifecycleError> {
    let id = RecordId::new(id)?;
    let payload = CollectionInfo::bind(args)?;
    if ledger.get_state(id.as_str())?.is_some() {
        return Err(LifecycleError::AlreadyExists { id: id.to_string() });
    }
    let record = Record::new(id.clone(), payload);
    store(ledger, &id, &record)?;
    tracing::info!(record_id = %record.id, op = %Operation::Create, stage = %record.stage, "record created");
    Ok(record)
}

/// Overwrite the collection payload of an unlocked record.
pub fn modify_create<L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    args: &[String],
) -> Result<Record, LifecycleError> {
    overwrite::<CollectionInfo, L>(ledger, id, args, Operation::ModifyCreate)
}

/// Dispute the collection stage.
pub fn reject_create<L: Ledger + ?Sized>(ledger: &mut L, id: &str) -> Result<Record, LifecycleError> {
    reject(ledger, id, Stage::Collected, Operation::RejectCreate)
}

// ─── Preservation ───────────────────────────────────────────────────

/// Advance `Collected -> Saved` with 14 preservation fields.
pub fn save<L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    args: &[String],
) -> Result<Record, LifecycleError> {
    advance::<PreservationInfo, L>(ledger, id, args, Operation::Save)
}

/// Overwrite the preservation payload, forcing the stage to `Saved`.
pub fn modify_save<L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    args: &[String],
) -> Result<Record, LifecycleError> {
    overwrite::<PreservationInfo, L>(ledger, id, args, Operation::ModifySave)
}

/// Dispute the preservation stage.
pub fn reject_save<L: Ledger + ?Sized>(ledger: &mut L, id: &str) -> Result<Record, LifecycleError> {
    reject(ledger, id, Stage::Saved, Operation::RejectSave)
}

// ─── Certification ──────────────────────────────────────────────────

/// Advance `Saved -> Entered` with 6 certification fields.
pub fn enter<L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    args: &[String],
) -> Result<Record, LifecycleError> {
    advance::<CertificationInfo, L>(ledger, id, args, Operation::Enter)
}

/// Overwrite the certification payload, forcing the stage to `Entered`.
pub fn modify_enter<L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    args: &[String],
) -> Result<Record, LifecycleError> {
    overwrite::<CertificationInfo, L>(ledger, id, args, Operation::ModifyEnter)
}

/// Dispute the certification stage.
pub fn reject_enter<L: Ledger + ?Sized>(ledger: &mut L, id: &str) -> Result<Record, LifecycleError> {
    reject(ledger, id, Stage::Entered, Operation::RejectEnter)
}

// ─── Sharing ────────────────────────────────────────────────────────

/// Advance `Entered -> Shared` with 7 sharing fields.
pub fn share<L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    args: &[String],
) -> Result<Record, LifecycleError> {
    advance::<SharingInfo, L>(ledger, id, args, Operation::Share)
}

/// Overwrite the sharing payload, forcing the stage to `Shared`.
pub fn modify_share<L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    args: &[String],
) -> Result<Record, LifecycleError> {
    overwrite::<SharingInfo, L>(ledger, id, args, Operation::ModifyShare)
}

/// Dispute the sharing stage.
pub fn reject_share<L: Ledger + ?Sized>(ledger: &mut L, id: &str) -> Result<Record, LifecycleError> {
    reject(ledger, id, Stage::Shared, Operation::RejectShare)
}

// ─── Finalization and removal ───────────────────────────────────────

/// Lock a `Shared` record permanently.
pub fn commit<L: Ledger + ?Sized>(ledger: &mut L, id: &str) -> Result<Record, LifecycleError> {
    let id = RecordId::new(id)?;
    let mut record = load(ledger, &id)?;
    let meta = ledger.tx_meta()?.clone();
    record.commit(&meta)?;
    store(ledger, &id, &record)?;
    tracing::info!(record_id = %record.id, tx_id = %meta.tx_id, "record committed");
    Ok(record)
}

/// Remove an unlocked record.
pub fn delete<L: Ledger + ?Sized>(ledger: &mut L, id: &str) -> Result<(), LifecycleError> {
    let id = RecordId::new(id)?;
    let record = load(ledger, &id)?;
    record.require_unlocked(Operation::Delete)?;
    ledger.del_state(id.as_str())?;
    tracing::info!(record_id = %id, stage = %record.stage, "record deleted");
    Ok(())
}

/// Remove a record whether or not it is locked.
///
/// Administrative escape hatch. Authorization is the ledger's concern.
pub fn admin_purge<L: Ledger + ?Sized>(ledger: &mut L, id: &str) -> Result<(), LifecycleError> {
    let id = RecordId::new(id)?;
    if ledger.get_state(id.as_str())?.is_none() {
        return Err(LifecycleError::NotFound { id: id.to_string() });
    }
    ledger.del_state(id.as_str())?;
    tracing::warn!(record_id = %id, "record purged");
    Ok(())
}

// ─── Shared steps ───────────────────────────────────────────────────

fn advance<P: PayloadSlot, L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    args: &[String],
    operation: Operation,
) -> Result<Record, LifecycleError> {
    let id = RecordId::new(id)?;
    let payload = P::bind(args)?;
    let mut record = load(ledger, &id)?;
    record.advance(payload, operation)?;
    store(ledger, &id, &record)?;
    tracing::info!(record_id = %record.id, op = %operation, stage = %record.stage, "record advanced");
    Ok(record)
}

fn overwrite<P: PayloadSlot, L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    args: &[String],
    operation: Operation,
) -> Result<Record, LifecycleError> {
    let id = RecordId::new(id)?;
    let payload = P::bind(args)?;
    let mut record = load(ledger, &id)?;
    let before = record.stage;
    record.overwrite(payload, operation)?;
    store(ledger, &id, &record)?;
    if before != record.stage {
        tracing::info!(record_id = %record.id, op = %operation, from = %before, stage = %record.stage, "stage moved by modify");
    } else {
        tracing::info!(record_id = %record.id, op = %operation, stage = %record.stage, "record modified");
    }
    Ok(record)
}

fn reject<L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &str,
    stage: Stage,
    operation: Operation,
) -> Result<Record, LifecycleError> {
    let id = RecordId::new(id)?;
    let mut record = load(ledger, &id)?;
    let meta = ledger.tx_meta()?.clone();
    record.reject(stage, operation, &meta)?;
    store(ledger, &id, &record)?;
    tracing::info!(record_id = %record.id, op = %operation, stage = %record.stage, tx_id = %meta.tx_id, "record disputed");
    Ok(record)
}

fn load<L: Ledger + ?Sized>(ledger: &L, id: &RecordId) -> Result<Record, LifecycleError> {
    let bytes = ledger
        .get_state(id.as_str())?
        .ok_or_else(|| LifecycleError::NotFound { id: id.to_string() })?;
    Record::from_bytes(id.as_str(), &bytes)
}

fn store<L: Ledger + ?Sized>(
    ledger: &mut L,
    id: &RecordId,
    record: &Record,
) -> Result<(), LifecycleError> {
    let bytes = record.to_bytes()?;
    ledger.put_state(id.as_str(), bytes)?;
    Ok(())
}
