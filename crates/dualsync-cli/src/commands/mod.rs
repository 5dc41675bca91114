pub mod association;
pub mod completions;
pub mod config;
pub mod log;
pub mod status;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use dualsync_cache::{DatabasePool, SqliteStateRepository};
use dualsync_core::config::Config;
use dualsync_core::ports::INotificationService;

use crate::notifier::{ConsoleNotifier, SilentNotifier};
use crate::output::OutputFormat;

/// Everything a command needs from the global flags
pub struct CliContext {
    pub format: OutputFormat,
    pub config: Config,
    pub config_path: PathBuf,
}

impl CliContext {
    /// Opens (creating if needed) the state database named in the config
    pub async fn open_store(&self) -> Result<Arc<SqliteStateRepository>> {
        let db_path = &self.config.storage.database;
        let pool = DatabasePool::new(db_path)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        tracing::debug!(db_path = %db_path.display(), "Opened state database");
        Ok(Arc::new(SqliteStateRepository::new(pool.pool().clone())))
    }

    pub fn notifier(&self) -> Arc<dyn INotificationService> {
        if self.config.notifications.enabled {
            Arc::new(ConsoleNotifier::new(self.format))
        } else {
            Arc::new(SilentNotifier)
        }
    }
}
