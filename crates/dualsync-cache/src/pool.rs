//! SQLite pool setup for the state store
//!
//! Both constructors enforce foreign keys and apply the embedded schema
//! before handing the pool out, so the link triggers and cascades are live
//! from the first query.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

const SCHEMA: &str = include_str!("migrations/20261018_initial.sql");

/// Connections per file-backed pool
const FILE_CONNECTIONS: u32 = 5;

/// How long a writer waits on a locked database file
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated SQLite pool backing [`crate::SqliteStateRepository`]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the state database at `db_path`, creating the file and its
    /// directory on first use. The file runs in WAL mode.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(dir) = db_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                CacheError::ConnectionFailed(format!("Cannot create {}: {e}", dir.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = open(options, FILE_CONNECTIONS)
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("{}: {e}", db_path.display())))?;
        migrate(&pool).await?;

        tracing::info!(path = %db_path.display(), "State database ready");
        Ok(Self { pool })
    }

    /// Private database that lives as long as the pool
    ///
    /// Each in-memory SQLite connection is its own database, so the pool
    /// holds exactly one.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?
            .foreign_keys(true);

        let pool = open(options, 1)
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("in-memory: {e}")))?;
        migrate(&pool).await?;

        tracing::debug!("In-memory state database ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn open(options: SqliteConnectOptions, connections: u32) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(connections)
        .connect_with(options)
        .await
}

/// Applies the schema; every statement in it is `IF NOT EXISTS`
async fn migrate(pool: &SqlitePool) -> Result<(), CacheError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| CacheError::MigrationFailed(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_names(pool: &DatabasePool) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(pool.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_pool_has_schema() {
        let pool = DatabasePool::in_memory().await.unwrap();
        let tables = table_names(&pool).await;

        for expected in [
            "associations",
            "catalog_entries",
            "diagnostics_log",
            "links",
            "run_state",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let pool = DatabasePool::in_memory().await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(pool.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_file_pool_creates_parent_dirs_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("state.db");

        let pool = DatabasePool::new(&db_path).await.unwrap();
        let first = table_names(&pool).await;
        pool.pool().close().await;
        assert!(db_path.exists());

        let reopened = DatabasePool::new(&db_path).await.unwrap();
        assert_eq!(table_names(&reopened).await, first);
        reopened.pool().close().await;
    }
}
