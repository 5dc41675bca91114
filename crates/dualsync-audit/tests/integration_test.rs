//! Integration test: DiagnosticsLogger → SQLite → query back
//!
//! Uses a real in-memory SQLite database to verify the full flow:
//! DiagnosticsLogger formats entries → IDiagnosticsSink persists them →
//! recent_diagnostics returns them.

use std::sync::Arc;
use std::time::Duration;

use dualsync_audit::DiagnosticsLogger;
use dualsync_cache::{pool::DatabasePool, SqliteStateRepository};
use dualsync_core::{
    domain::{newtypes::ExternalId, RunMode},
    ports::IDiagnosticsSink,
};

async fn make_repo() -> Arc<SqliteStateRepository> {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    Arc::new(SqliteStateRepository::new(pool.pool().clone()))
}

#[tokio::test]
async fn test_diagnostics_logger_integration_with_sqlite() {
    let repo = make_repo().await;
    let logger = DiagnosticsLogger::new(Arc::clone(&repo) as Arc<dyn IDiagnosticsSink>);

    let association = repo
        .add_association(
            std::path::Path::new("/home/user/Docs"),
            std::path::Path::new("/mnt/share/Docs"),
        )
        .await
        .unwrap();

    logger.log_run_start(RunMode::OnDemand).await;
    logger.log_association(&association).await;
    logger
        .log_item_failure(
            &ExternalId::new("notes.txt").unwrap(),
            &anyhow::anyhow!("target is read-only"),
        )
        .await;
    logger
        .log_run_complete(RunMode::OnDemand, Duration::from_millis(20), 0, 0, 1, false)
        .await;

    let entries = repo.recent_diagnostics(50).await.unwrap();
    assert_eq!(entries.len(), 4, "Expected 4 entries, got {}", entries.len());

    // Newest first
    assert!(entries[0].message.starts_with("Run completed (on-demand)"));
    assert!(entries[1].message.starts_with("Item notes.txt failed: target is read-only"));
    assert!(entries[2].message.starts_with(&format!("Association {}", association.id())));
    assert_eq!(entries[3].message, "Run started (on-demand)");
}
