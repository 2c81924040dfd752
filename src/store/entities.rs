use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::utils::time::minutes_to_hhmm;

/// Where a session came from: detected by the monitor or startup flow, or
/// entered by the user as a correction.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SessionSource {
    Auto,
    Manual,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// First session of the day.
    Start,
    /// Resumption after an idle or break period.
    Activity,
    /// Explicit break taken by the user.
    Break,
    /// Day-end session.
    Finish,
}

/// A contiguous work interval. Times stay `HH:MM` strings end to end: that is
/// the on-disk contract, and the summary engine parses them per entry so a
/// single malformed value never poisons the rest of the day.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Session {
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    pub source: SessionSource,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Session {
    /// An open session has not been closed yet. Empty strings count as open
    /// so hand-edited files behave like freshly written ones.
    pub fn is_open(&self) -> bool {
        self.end_time.as_deref().map_or(true, str::is_empty)
    }
}

/// An interval where the user was not actively working: idle, locked, or on a
/// declared break.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct InactivePeriod {
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl InactivePeriod {
    pub fn is_open(&self) -> bool {
        self.end_time.as_deref().map_or(true, str::is_empty)
    }
}

/// Derived metrics for one day. Recomputed by the summary engine;
/// `manual_adjustments` is the only field that survives recomputation.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct DaySummary {
    pub missing_time: String,
    pub total_tracked: String,
    pub total_inactive: String,
    pub manual_adjustments: String,
    pub total_reported: String,
    pub overtime: String,
    pub met_target: bool,
}

impl DaySummary {
    /// Summary of a day with no activity yet: everything still missing.
    pub fn empty(required_time: &str) -> Self {
        Self {
            missing_time: required_time.to_string(),
            total_tracked: minutes_to_hhmm(0),
            total_inactive: minutes_to_hhmm(0),
            manual_adjustments: minutes_to_hhmm(0),
            total_reported: minutes_to_hhmm(0),
            overtime: minutes_to_hhmm(0),
            met_target: false,
        }
    }
}

/// Everything recorded for one calendar date.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct DayLog {
    #[serde(default)]
    pub work_location: Option<String>,
    pub required_time: String,
    pub sessions: Vec<Session>,
    pub inactive_periods: Vec<InactivePeriod>,
    pub summary: DaySummary,
}

impl DayLog {
    pub fn new(required_time: String) -> Self {
        Self {
            work_location: None,
            summary: DaySummary::empty(&required_time),
            required_time,
            sessions: Vec::new(),
            inactive_periods: Vec::new(),
        }
    }
}

/// Why the watcher considered the user away. Recorded verbatim as the note
/// of the inactive period it opens.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum IdleReason {
    Idle,
    Locked,
}

impl IdleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdleReason::Idle => "idle",
            IdleReason::Locked => "locked",
        }
    }
}

impl Display for IdleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
