//! How a reconciliation run was started

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mode of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Scheduler-driven background run under the time budget; large
    /// objects are postponed
    TimeBoxed,
    /// User-initiated run; large objects are processed
    OnDemand,
}

impl RunMode {
    /// True if the per-item budget check and large-object guard apply
    pub fn is_time_boxed(self) -> bool {
        matches!(self, RunMode::TimeBoxed)
    }

    /// Label used in the user-facing summary
    pub fn summary_label(self) -> &'static str {
        match self {
            RunMode::TimeBoxed => "BackgroundTask",
            RunMode::OnDemand => "ManualSync",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::TimeBoxed => write!(f, "time-boxed"),
            RunMode::OnDemand => write!(f, "on-demand"),
        }
    }
}
