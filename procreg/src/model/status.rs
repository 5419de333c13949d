//! Unit status values.

use serde::{Deserialize, Serialize};

/// Progress of one routed unit.
///
/// A unit starts `Pending` when the summary is written and moves to `Done`
/// when its completion is reported. Re-reporting is an overwrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitStatus {
    #[default]
    Pending,
    Done,
}

impl UnitStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, UnitStatus::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Pending => "PENDING",
            UnitStatus::Done => "DONE",
        }
    }
}

impl std::str::FromStr for UnitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(UnitStatus::Pending),
            "DONE" => Ok(UnitStatus::Done),
            other => Err(format!("unknown unit status '{}'", other)),
        }
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
