use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reference::Ref;

/// How the predecessor's and successor's start/finish instants are tied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// Successor starts after predecessor finishes
    #[default]
    #[serde(rename = "FS")]
    FinishToStart,
    /// Successor starts after predecessor starts
    #[serde(rename = "SS")]
    StartToStart,
    /// Successor finishes after predecessor finishes
    #[serde(rename = "FF")]
    FinishToFinish,
    /// Successor finishes after predecessor starts
    #[serde(rename = "SF")]
    StartToFinish,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 4] = [
        DependencyKind::FinishToStart,
        DependencyKind::StartToStart,
        DependencyKind::FinishToFinish,
        DependencyKind::StartToFinish,
    ];

    pub fn code(self) -> &'static str {
        match self {
            DependencyKind::FinishToStart => "FS",
            DependencyKind::StartToStart => "SS",
            DependencyKind::FinishToFinish => "FF",
            DependencyKind::StartToFinish => "SF",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DependencyKind::FinishToStart => "Finish-to-Start",
            DependencyKind::StartToStart => "Start-to-Start",
            DependencyKind::FinishToFinish => "Finish-to-Finish",
            DependencyKind::StartToFinish => "Start-to-Finish",
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for DependencyKind {
    type Err = String;

    /// Accepts the two-letter code in any case; blank means the default (FS)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(DependencyKind::default());
        }
        DependencyKind::ALL
            .into_iter()
            .find(|k| k.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid dependency type '{}' (expected: FS, SS, FF, SF)", s))
    }
}

/// A directed edge `predecessor → successor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: u64,
    pub predecessor: Ref,
    pub successor: Ref,
    #[serde(rename = "type", default)]
    pub kind: DependencyKind,
    /// Signed day offset applied to the constraint
    #[serde(default)]
    pub lag_days: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /dependencies/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDependency {
    pub predecessor: u64,
    pub successor: u64,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    pub lag_days: i32,
}

/// Body of `PATCH /dependencies/{id}/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<DependencyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lag_days: Option<i32>,
}

impl DependencyPatch {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.lag_days.is_none()
    }
}

/// Parse a lag-days form field. Empty or unparseable input counts as 0.
pub fn coerce_lag_days(raw: &str) -> i32 {
    raw.trim().parse::<i32>().unwrap_or(0)
}
