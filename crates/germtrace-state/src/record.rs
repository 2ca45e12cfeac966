//! # Specimen Record
//!
//! The aggregate root stored under each record id, and the in-memory
//! transition rules that govern it.
//!
//! ## Transition Rules
//!
//! | Kind | Precondition | Effect |
//! |---|---|---|
//! | advance | unlocked, `stage` is the one before the payload's stage | payload written, `stage` moves forward, `disputed` cleared |
//! | overwrite | unlocked | payload written, `stage` forced to the payload's stage, `disputed` cleared |
//! | reject | unlocked, `stage` equals the rejected stage | `disputed` set, rejection metadata stamped |
//! | commit | unlocked, `stage == Shared` | `locked` set, finalization metadata stamped |
//!
//! `locked` is absorbing: every rule above fails with `AlreadyFinalized` on
//! a locked record. The methods here never touch the ledger or a clock; the
//! caller supplies transaction metadata.

use germtrace_core::{ContentHash, RecordId, Timestamp, TxId};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;
use crate::ledger::{LedgerError, TxMeta};
use crate::operation::Operation;
use crate::payload::{
    CertificationInfo, CollectionInfo, PreservationInfo, SharingInfo, StagePayload,
};
use crate::stage::Stage;

/// Traceability record for one germplasm specimen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Ledger key; never changes after creation.
    pub id: RecordId,
    /// Last stage whose payload was written.
    pub stage: Stage,
    /// Set by commit. A locked record is immutable.
    pub locked: bool,
    /// Set by a reject, cleared by any payload write.
    pub disputed: bool,
    /// Timestamp of the last reject or commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<Timestamp>,
    /// Transaction of the last reject or commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalizing_tx_id: Option<TxId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_info: Option<CollectionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preservation_info: Option<PreservationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_info: Option<CertificationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharing_info: Option<SharingInfo>,
    /// Only ever true on a synthesized history tombstone.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

/// Where a payload type lives on a [`Record`].
pub trait PayloadSlot: StagePayload {
    /// Mutable access to the payload's field on the record.
    fn slot(record: &mut Record) -> &mut Option<Self>;
}

impl PayloadSlot for CollectionInfo {
    fn slot(record: &mut Record) -> &mut Option<Self> {
        &mut record.collection_info
    }
}

impl PayloadSlot for PreservationInfo {
    fn slot(record: &mut Record) -> &mut Option<Self> {
        &mut record.preservation_info
    }
}

impl PayloadSlot for CertificationInfo {
    fn slot(record: &mut Record) -> &mut Option<Self> {
        &mut record.certification_info
    }
}

impl PayloadSlot for SharingInfo {
    fn slot(record: &mut Record) -> &mut Option<Self> {
        &mut record.sharing_info
    }
}

impl Record {
    /// A freshly created record at `Collected`.
    pub fn new(id: RecordId, collection: CollectionInfo) -> Self {
        Self {
            id,
            stage: Stage::Collected,
            locked: false,
            disputed: false,
            finalized_at: None,
            finalizing_tx_id: None,
            collection_info: Some(collection),
            preservation_info: None,
            certification_info: None,
            sharing_info: None,
            deleted: false,
        }
    }

    /// Synthetic snapshot standing in for a deleted version in history.
    pub fn tombstone(id: RecordId) -> Self {
        Self {
            id,
            stage: Stage::default(),
            locked: false,
            disputed: false,
            finalized_at: None,
            finalizing_tx_id: None,
            collection_info: None,
            preservation_info: None,
            certification_info: None,
            sharing_info: None,
            deleted: true,
        }
    }

    /// Decode the snapshot stored under key `id`.
    ///
    /// `stage`, `locked` and `disputed` must be present, and the embedded
    /// id must equal the key; anything else is `CorruptRecord`.
    pub fn from_bytes(id: &str, bytes: &[u8]) -> Result<Self, LifecycleError> {
        let corrupt = |source| LifecycleError::CorruptRecord {
            id: id.to_string(),
            source,
        };
        let record: Self = serde_json::from_slice(bytes).map_err(corrupt)?;
        if record.id.as_str() != id {
            return Err(corrupt(serde_json::Error::custom(format!(
                "stored under key {id} but carries id {}",
                record.id
            ))));
        }
        Ok(record)
    }

    /// Encode for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LifecycleError> {
        serde_json::to_vec(self).map_err(|e| LifecycleError::Storage(LedgerError::Encoding(e)))
    }

    /// Fail with `AlreadyFinalized` if the record is locked.
    pub fn require_unlocked(&self, operation: Operation) -> Result<(), LifecycleError> {
        if self.locked {
            return Err(LifecycleError::AlreadyFinalized {
                id: self.id.to_string(),
                operation,
            });
        }
        Ok(())
    }

    /// Fail with `InvalidStateTransition` unless the record is at `expected`.
    pub fn require_stage(
        &self,
        expected: Stage,
        operation: Operation,
    ) -> Result<(), LifecycleError> {
        if self.stage != expected {
            return Err(LifecycleError::InvalidStateTransition {
                operation,
                expected,
                actual: self.stage,
            });
        }
        Ok(())
    }

    /// Write the next stage's payload, requiring the exact preceding stage.
    pub fn advance<P: PayloadSlot>(
        &mut self,
        payload: P,
        operation: Operation,
    ) -> Result<(), LifecycleError> {
        self.require_unlocked(operation)?;
        if let Some(required) = P::STAGE.previous() {
            self.require_stage(required, operation)?;
        }
        self.install(payload);
        Ok(())
    }

    /// Overwrite a stage's payload regardless of the current stage.
    ///
    /// Moves `stage` to the payload's stage, which may be forward or
    /// backward of where the record was. Corrections are allowed to jump
    /// the pointer; only the lock is enforced.
    pub fn overwrite<P: PayloadSlot>(
        &mut self,
        payload: P,
        operation: Operation,
    ) -> Result<(), LifecycleError> {
        self.require_unlocked(operation)?;
        self.install(payload);
        Ok(())
    }

    /// Mark the current stage's advance as rejected.
    ///
    /// `stage` is left where it is; a matching overwrite is needed to clear
    /// the dispute.
    pub fn reject(
        &mut self,
        stage: Stage,
        operation: Operation,
        meta: &TxMeta,
    ) -> Result<(), LifecycleError> {
        self.require_unlocked(operation)?;
        self.require_stage(stage, operation)?;
        self.disputed = true;
        self.stamp(meta);
        Ok(())
    }

    /// Lock the record permanently.
    pub fn commit(&mut self, meta: &TxMeta) -> Result<(), LifecycleError> {
        self.require_unlocked(Operation::Commit)?;
        self.require_stage(Stage::Shared, Operation::Commit)?;
        self.locked = true;
        self.stamp(meta);
        Ok(())
    }

    /// Recompute every present payload's hash and compare with the stored one.
    ///
    /// Lifecycle operations never call this; it serves external audits.
    pub fn audit(&self) -> IntegrityReport {
        let mut findings = Vec::new();
        if let Some(p) = &self.collection_info {
            findings.push(IntegrityFinding::of(p));
        }
        if let Some(p) = &self.preservation_info {
            findings.push(IntegrityFinding::of(p));
        }
        if let Some(p) = &self.certification_info {
            findings.push(IntegrityFinding::of(p));
        }
        if let Some(p) = &self.sharing_info {
            findings.push(IntegrityFinding::of(p));
        }
        IntegrityReport {
            id: self.id.clone(),
            findings,
        }
    }

    fn install<P: PayloadSlot>(&mut self, payload: P) {
        *P::slot(self) = Some(payload);
        self.stage = P::STAGE;
        self.disputed = false;
    }

    fn stamp(&mut self, meta: &TxMeta) {
        self.finalized_at = Some(meta.timestamp);
        self.finalizing_tx_id = Some(meta.tx_id.clone());
    }
}

/// Stored versus recomputed hash of one stage payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityFinding {
    pub stage: Stage,
    pub stored: ContentHash,
    pub recomputed: ContentHash,
}

impl IntegrityFinding {
    fn of<P: StagePayload>(payload: &P) -> Self {
        Self {
            stage: P::STAGE,
            stored: *payload.content_hash(),
            recomputed: payload.recompute_hash(),
        }
    }

    /// Whether the stored hash still matches the payload.
    pub fn is_intact(&self) -> bool {
        self.stored == self.recomputed
    }
}

/// Result of auditing every payload on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub id: RecordId,
    pub findings: Vec<IntegrityFinding>,
}

impl IntegrityReport {
    /// Whether every payload's stored hash matches.
    pub fn is_intact(&self) -> bool {
        self.findings.iter().all(IntegrityFinding::is_intact)
    }

    /// Stages whose stored hash does not match.
    pub fn tampered_stages(&self) -> Vec<Stage> {
        self.findings
            .iter()
            .filter(|f| !f.is_intact())
            .map(|f| f.stage)
            .collect()
    }
}
