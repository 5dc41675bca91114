//! Transfer counters and the end-of-run summary

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use dualsync_core::domain::{Origin, RunMode};
use dualsync_core::ports::Notification;

/// chrono format of the persisted last-sync timestamp (`yyyy-MM-ddTHH:mm:ssZ`)
pub const LAST_SYNC_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Formats a completion instant the way it is stored in the run state
pub fn format_last_sync(at: DateTime<Utc>) -> String {
    at.format(LAST_SYNC_FORMAT).to_string()
}

/// Per-run count of files written to each side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferCounters {
    pub uploads: u32,
    pub downloads: u32,
}

impl TransferCounters {
    /// Count one executed write to `target`. Collections are not counted.
    pub fn record_write(&mut self, target: Origin, is_collection: bool) {
        if is_collection {
            return;
        }
        match target {
            Origin::Remote => self.uploads += 1,
            Origin::Local => self.downloads += 1,
        }
    }
}

/// Outcome of one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub counters: TransferCounters,
    /// Items whose reconciliation failed and was isolated
    pub failures: u32,
    pub associations_processed: u32,
    /// True if the time budget ended the run before all work was visited
    pub stopped_early: bool,
    pub duration_ms: u64,
    /// Completion timestamp in [`LAST_SYNC_FORMAT`]
    pub completed_at: String,
}

impl RunSummary {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// One-line summary shown to the user
    pub fn message(&self) -> String {
        format!(
            "{}: {} Files Uploaded, {} Files Downloaded",
            self.mode.summary_label(),
            self.counters.uploads,
            self.counters.downloads
        )
    }

    pub fn notification(&self) -> Notification {
        Notification::sync("Synchronization finished", self.message())
    }
}
