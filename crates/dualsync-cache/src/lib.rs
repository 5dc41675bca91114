//! dualsync Cache - Persistent reconciliation state
//!
//! SQLite-based storage for:
//! - Configured associations
//! - The item catalog (one entry per association, origin and external identity)
//! - Links between catalog entries
//! - Run state (last sync timestamp)
//! - The diagnostics log
//!
//! ## Architecture
//!
//! This crate implements the store ports from `dualsync-core`
//! (`ICatalogStore`, `ILinkStore`, `IAssociationRegistry`, `IRunStateStore`
//! and `IDiagnosticsSink`) using SQLite as the storage backend. It is a
//! driven (secondary) adapter in the hexagonal architecture.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use dualsync_cache::{DatabasePool, SqliteStateRepository};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/dualsync/dualsync.db")).await?;
//! let repo = SqliteStateRepository::new(pool.pool().clone());
//! let association = repo
//!     .add_association(Path::new("/home/user/Docs"), Path::new("/mnt/share/Docs"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::{DiagnosticEntry, SqliteStateRepository};

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be mapped back to a domain type
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An update addressed a row that does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
