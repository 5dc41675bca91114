//! Sync command - Run one reconciliation cycle
//!
//! Provides the `dualsync sync` CLI command which:
//! 1. Opens the state database named in the configuration
//! 2. Creates a directory adapter for each side
//! 3. Runs the ReconciliationEngine and displays the summary

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;

use dualsync_audit::DiagnosticsLogger;
use dualsync_core::domain::RunMode;
use dualsync_sync::engine::{Adapters, ReconciliationEngine, Stores};
use dualsync_sync::filesystem::DirectoryAdapter;
use dualsync_sync::summary::RunSummary;

use super::CliContext;
use crate::output::{format_duration_ms, get_formatter, plural};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Run as a scheduled background task: stop after the time budget and
    /// postpone large items
    #[arg(long)]
    pub time_boxed: bool,
}

impl SyncCommand {
    pub fn mode(&self) -> RunMode {
        if self.time_boxed {
            RunMode::TimeBoxed
        } else {
            RunMode::OnDemand
        }
    }

    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let store = ctx.open_store().await?;

        let adapters = Adapters::new(
            Arc::new(DirectoryAdapter::local()),
            Arc::new(DirectoryAdapter::remote()),
        )?;
        let engine = ReconciliationEngine::new(
            adapters,
            Stores::from_shared(store.clone()),
            ctx.notifier(),
            DiagnosticsLogger::new(store),
        );

        let mode = self.mode();
        info!(%mode, "Starting synchronization");
        formatter.info("Starting synchronization...");

        let summary = engine.run(mode).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&summary)?);
        } else {
            print_summary(formatter.as_ref(), &summary);
        }
        Ok(())
    }
}

fn print_summary(formatter: &dyn crate::output::OutputFormatter, summary: &RunSummary) {
    let duration = format_duration_ms(summary.duration_ms);
    if summary.counters.uploads == 0 && summary.counters.downloads == 0 && summary.failures == 0 {
        formatter.success(&format!("Already up to date ({duration})"));
    } else {
        formatter.success(&format!("Sync completed in {duration}"));
    }

    formatter.info(&format!(
        "Uploaded:   {}",
        plural(summary.counters.uploads, "file")
    ));
    formatter.info(&format!(
        "Downloaded: {}",
        plural(summary.counters.downloads, "file")
    ));
    formatter.info(&format!(
        "Associations processed: {}",
        summary.associations_processed
    ));

    if summary.failures > 0 {
        formatter.error(&format!(
            "{} could not be synchronized; run 'dualsync log' for details",
            plural(summary.failures, "item")
        ));
    }
    if summary.stopped_early {
        formatter.warn("Time budget exhausted; remaining work is deferred to the next run");
    }
}
