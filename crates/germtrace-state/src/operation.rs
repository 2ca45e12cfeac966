//! # Operation Names
//!
//! The closed set of operations exposed at the dispatch boundary. Names are
//! kebab-case on the wire; the chaincode function names used by earlier
//! clients of the ledger are accepted as aliases.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stage::Stage;

/// An operation callable through [`crate::dispatch::dispatch()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Create,
    ModifyCreate,
    RejectCreate,
    Save,
    ModifySave,
    RejectSave,
    Enter,
    ModifyEnter,
    RejectEnter,
    Share,
    ModifyShare,
    RejectShare,
    Commit,
    Delete,
    AdminPurge,
    Exists,
    Read,
    ReadRange,
    ReadHistory,
}

impl Operation {
    /// Every operation, in dispatch-table order.
    pub const ALL: [Operation; 19] = [
        Self::Create,
        Self::ModifyCreate,
        Self::RejectCreate,
        Self::Save,
        Self::ModifySave,
        Self::RejectSave,
        Self::Enter,
        Self::ModifyEnter,
        Self::RejectEnter,
        Self::Share,
        Self::ModifyShare,
        Self::RejectShare,
        Self::Commit,
        Self::Delete,
        Self::AdminPurge,
        Self::Exists,
        Self::Read,
        Self::ReadRange,
        Self::ReadHistory,
    ];

    /// Kebab-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::ModifyCreate => "modify-create",
            Self::RejectCreate => "reject-create",
            Self::Save => "save",
            Self::ModifySave => "modify-save",
            Self::RejectSave => "reject-save",
            Self::Enter => "enter",
            Self::ModifyEnter => "modify-enter",
            Self::RejectEnter => "reject-enter",
            Self::Share => "share",
            Self::ModifyShare => "modify-share",
            Self::RejectShare => "reject-share",
            Self::Commit => "commit",
            Self::Delete => "delete",
            Self::AdminPurge => "admin-purge",
            Self::Exists => "exists",
            Self::Read => "read",
            Self::ReadRange => "read-range",
            Self::ReadHistory => "read-history",
        }
    }

    /// Chaincode function name this operation replaces.
    pub fn legacy_name(&self) -> &'static str {
        match self {
            Self::Create => "CreateFruitInfo",
            Self::ModifyCreate => "ModifyCreateFruitInfo",
            Self::RejectCreate => "RejectCreate",
            Self::Save => "SaveFruitInfo",
            Self::ModifySave => "ModifySaveFruitInfo",
            Self::RejectSave => "RejectSave",
            Self::Enter => "EnterFruitInfo",
            Self::ModifyEnter => "ModifyEnterFruitInfo",
            Self::RejectEnter => "RejectEnter",
            Self::Share => "ShareFruitInfo",
            Self::ModifyShare => "ModifyShareFruitInfo",
            Self::RejectShare => "RejectShare",
            Self::Commit => "LoadFruitInfo",
            Self::Delete => "DeleteFruitInfo",
            Self::AdminPurge => "ProgrammerDeleteFruitInfo",
            Self::Exists => "FruitInfoExists",
            Self::Read => "ReadFruitInfo",
            Self::ReadRange => "ReadFruitInfoByRange",
            Self::ReadHistory => "ReadHistory",
        }
    }

    /// Whether the operation writes to the ledger.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::Exists | Self::Read | Self::ReadRange | Self::ReadHistory
        )
    }

    /// The stage whose payload this operation binds from its arguments.
    pub fn payload_stage(&self) -> Option<Stage> {
        match self {
            Self::Create | Self::ModifyCreate => Some(Stage::Collected),
            Self::Save | Self::ModifySave => Some(Stage::Saved),
            Self::Enter | Self::ModifyEnter => Some(Stage::Entered),
            Self::Share | Self::ModifyShare => Some(Stage::Shared),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A name that matches no operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown operation {0:?}")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s || op.legacy_name() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_roundtrip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_legacy_names_resolve() {
        assert_eq!("LoadFruitInfo".parse::<Operation>().unwrap(), Operation::Commit);
        assert_eq!(
            "ProgrammerDeleteFruitInfo".parse::<Operation>().unwrap(),
            Operation::AdminPurge
        );
        assert_eq!("RejectSave".parse::<Operation>().unwrap(), Operation::RejectSave);
    }

    #[test]
    fn test_unknown_name() {
        let err = "teleport".parse::<Operation>().unwrap_err();
        assert_eq!(err.to_string(), "unknown operation \"teleport\"");
    }

    #[test]
    fn test_payload_stage_only_for_writers() {
        assert_eq!(Operation::ModifyEnter.payload_stage(), Some(Stage::Entered));
        assert_eq!(Operation::RejectEnter.payload_stage(), None);
        assert_eq!(Operation::Commit.payload_stage(), None);
    }

    #[test]
    fn test_reads_are_not_mutations() {
        assert!(!Operation::ReadHistory.is_mutation());
        assert!(Operation::AdminPurge.is_mutation());
    }
}
