//! Diagnostics sink port (driven/secondary port)
//!
//! A durable, append-only log of human-readable diagnostics lines. The audit
//! crate formats entries; implementations only store them.

/// Port trait for the durable diagnostics log
#[async_trait::async_trait]
pub trait IDiagnosticsSink: Send + Sync {
    /// Appends one entry
    async fn write(&self, message: &str) -> anyhow::Result<()>;
}
