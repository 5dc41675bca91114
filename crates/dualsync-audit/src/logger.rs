//! DiagnosticsLogger - durable run diagnostics
//!
//! Wraps `IDiagnosticsSink::write()` with one method per diagnosable event
//! of a reconciliation run. All methods are non-fatal: errors writing the
//! log are reported via `tracing::warn!` but never propagated.

use std::sync::Arc;
use std::time::Duration;

use dualsync_core::{
    domain::{newtypes::ExternalId, Association, AssociationId, RunMode},
    ports::IDiagnosticsSink,
};

/// Writes formatted diagnostics entries to the durable log.
///
/// All methods silently swallow errors (logging a warning) to ensure
/// diagnostics failures never break a run.
#[derive(Clone)]
pub struct DiagnosticsLogger {
    sink: Arc<dyn IDiagnosticsSink>,
}

impl DiagnosticsLogger {
    /// Creates a new `DiagnosticsLogger` backed by the given sink.
    pub fn new(sink: Arc<dyn IDiagnosticsSink>) -> Self {
        Self { sink }
    }

    async fn write(&self, message: String) {
        if let Err(e) = self.sink.write(&message).await {
            tracing::warn!(error = %e, "Failed to write diagnostics entry");
        }
    }

    // ========================================================================
    // Run lifecycle
    // ========================================================================

    /// Log the start of a run.
    pub async fn log_run_start(&self, mode: RunMode) {
        self.write(format!("Run started ({mode})")).await;
    }

    /// Log the end of a run, including runs stopped by the time budget.
    pub async fn log_run_complete(
        &self,
        mode: RunMode,
        duration: Duration,
        uploads: u32,
        downloads: u32,
        failures: u32,
        stopped_early: bool,
    ) {
        let outcome = if stopped_early {
            "stopped by time budget"
        } else {
            "completed"
        };
        self.write(format!(
            "Run {outcome} ({mode}) in {}ms: {uploads} uploaded, {downloads} downloaded, {failures} failed",
            duration.as_millis()
        ))
        .await;
    }

    /// Log that the time budget ran out.
    pub async fn log_budget_stop(&self, elapsed: Duration, association_id: AssociationId) {
        self.write(format!(
            "Time budget exhausted after {}s in association {association_id}; remaining work deferred",
            elapsed.as_secs()
        ))
        .await;
    }

    // ========================================================================
    // Association processing
    // ========================================================================

    /// Log that an association is about to be processed.
    pub async fn log_association(&self, association: &Association) {
        self.write(format!(
            "Association {}: {} <-> {}",
            association.id(),
            association.local_root().display(),
            association.remote_root().display()
        ))
        .await;
    }

    /// Log the size of both snapshots of an association.
    pub async fn log_scan(&self, association_id: AssociationId, remote: usize, local: usize) {
        self.write(format!(
            "Association {association_id}: scanned {remote} remote and {local} local items"
        ))
        .await;
    }

    // ========================================================================
    // Failures
    // ========================================================================

    /// Log an item that could not be reconciled, with its full error chain.
    pub async fn log_item_failure(&self, external_id: &ExternalId, error: &anyhow::Error) {
        self.write(format!(
            "Item {external_id} failed: {error}\n{error:?}"
        ))
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory sink that records every entry
    struct MockSink {
        entries: Mutex<Vec<String>>,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                entries: Mutex::new(Vec::new()),
            }
        }

        fn entries(&self) -> Vec<String> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IDiagnosticsSink for MockSink {
        async fn write(&self, message: &str) -> anyhow::Result<()> {
            self.entries.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct BrokenSink;

    #[async_trait]
    impl IDiagnosticsSink for BrokenSink {
        async fn write(&self, _message: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn test_log_run_start() {
        let sink = Arc::new(MockSink::new());
        let logger = DiagnosticsLogger::new(sink.clone());

        logger.log_run_start(RunMode::TimeBoxed).await;

        assert_eq!(sink.entries(), vec!["Run started (time-boxed)".to_string()]);
    }

    #[tokio::test]
    async fn test_log_run_complete() {
        let sink = Arc::new(MockSink::new());
        let logger = DiagnosticsLogger::new(sink.clone());

        logger
            .log_run_complete(RunMode::OnDemand, Duration::from_millis(1500), 2, 3, 1, false)
            .await;
        logger
            .log_run_complete(RunMode::TimeBoxed, Duration::from_secs(540), 0, 0, 0, true)
            .await;

        let entries = sink.entries();
        assert_eq!(
            entries[0],
            "Run completed (on-demand) in 1500ms: 2 uploaded, 3 downloaded, 1 failed"
        );
        assert!(entries[1].starts_with("Run stopped by time budget (time-boxed)"));
    }

    #[tokio::test]
    async fn test_log_association_and_scan() {
        let sink = Arc::new(MockSink::new());
        let logger = DiagnosticsLogger::new(sink.clone());
        let association =
            Association::new(AssociationId::new(4), "/home/user/Docs", "/mnt/share/Docs").unwrap();

        logger.log_association(&association).await;
        logger.log_scan(association.id(), 7, 5).await;

        let entries = sink.entries();
        assert_eq!(entries[0], "Association 4: /home/user/Docs <-> /mnt/share/Docs");
        assert_eq!(entries[1], "Association 4: scanned 7 remote and 5 local items");
    }

    #[tokio::test]
    async fn test_log_item_failure_includes_chain() {
        let sink = Arc::new(MockSink::new());
        let logger = DiagnosticsLogger::new(sink.clone());
        let id = ExternalId::new("docs/report.pdf").unwrap();
        let error = anyhow::anyhow!("permission denied").context("Failed to copy docs/report.pdf");

        logger.log_item_failure(&id, &error).await;

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("Item docs/report.pdf failed: Failed to copy docs/report.pdf"));
        assert!(entries[0].contains("permission denied"));
    }

    #[tokio::test]
    async fn test_sink_errors_are_swallowed() {
        let logger = DiagnosticsLogger::new(Arc::new(BrokenSink));

        // Must not panic or propagate
        logger.log_run_start(RunMode::OnDemand).await;
        logger
            .log_budget_stop(Duration::from_secs(540), AssociationId::new(1))
            .await;
    }
}
