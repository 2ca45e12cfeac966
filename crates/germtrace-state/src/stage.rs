//! # Pipeline Stages
//!
//! The four approval stages a specimen record moves through. The stage on a
//! record is the last stage whose payload was successfully written.
//!
//! ```text
//! Collected(0) ──save──▶ Saved(1) ──enter──▶ Entered(2) ──share──▶ Shared(3) ──commit──▶ locked
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One step of the approval pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Stage {
    /// Specimen collected and described in the field.
    #[default]
    Collected = 0,
    /// Specimen accessioned into a preservation facility.
    Saved = 1,
    /// Preservation certified and entered into the catalogue.
    Entered = 2,
    /// Specimen released for sharing.
    Shared = 3,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 4] = [Self::Collected, Self::Saved, Self::Entered, Self::Shared];

    /// Zero-based position in the pipeline. Also the legacy numeric status.
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// The stage an advance moves to, or `None` from the last stage.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::Collected => Some(Self::Saved),
            Self::Saved => Some(Self::Entered),
            Self::Entered => Some(Self::Shared),
            Self::Shared => None,
        }
    }

    /// The stage an advance into `self` requires, or `None` for the first stage.
    pub fn previous(&self) -> Option<Stage> {
        match self {
            Self::Collected => None,
            Self::Saved => Some(Self::Collected),
            Self::Entered => Some(Self::Saved),
            Self::Shared => Some(Self::Entered),
        }
    }

    /// Variant name as displayed in errors and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collected => "Collected",
            Self::Saved => "Saved",
            Self::Entered => "Entered",
            Self::Shared => "Shared",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage name that is neither a known variant nor a legacy status digit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown stage {0:?}")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    /// Accepts the variant name in any case, or the legacy status string
    /// `"0"` through `"3"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collected" | "collect" | "0" => Ok(Self::Collected),
            "saved" | "save" | "1" => Ok(Self::Saved),
            "entered" | "enter" | "2" => Ok(Self::Entered),
            "shared" | "share" | "3" => Ok(Self::Shared),
            _ => Err(UnknownStage(s.to_string())),
        }
    }
}
