//! SQLite implementation of the store ports
//!
//! This module provides the concrete SQLite-based implementation of the
//! catalog, link, association, run-state and diagnostics ports defined in
//! dualsync-core. It handles the mapping between domain types and columns.
//!
//! ## Type Mapping
//!
//! | Domain Type                          | SQL Type | Strategy                               |
//! |--------------------------------------|----------|----------------------------------------|
//! | AssociationId, CatalogId, LinkId     | INTEGER  | Rowid via `.get()` / `::new()`         |
//! | Origin                               | TEXT     | `"local"` / `"remote"` via `FromStr`   |
//! | ExternalId                           | TEXT     | String via `.as_str()` / `ExternalId::new()` |
//! | Fingerprint                          | TEXT     | String via `.as_str()` / `Fingerprint::new()` |
//! | ChangeVersion, size                  | INTEGER  | u64 stored as i64, rejected if negative |
//! | bool                                 | INTEGER  | 0 / 1                                  |
//! | DateTime<Utc>                        | TEXT     | ISO 8601 via `to_rfc3339()`            |

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use dualsync_core::domain::{
    newtypes::{AssociationId, CatalogId, ChangeVersion, ExternalId, Fingerprint, LinkId},
    Association, Item, Link, Origin,
};
use dualsync_core::ports::{
    CatalogEntry, IAssociationRegistry, ICatalogStore, IDiagnosticsSink, ILinkStore,
    IRunStateStore,
};

use crate::CacheError;

/// `run_state` key holding the last completion timestamp
const LAST_SYNC_KEY: &str = "last_sync";

/// One line of the durable diagnostics log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// SQLite-based implementation of every store port
///
/// All operations are performed through a connection pool; the value is
/// cheap to clone and is usually shared behind an `Arc`.
#[derive(Clone)]
pub struct SqliteStateRepository {
    pool: SqlitePool,
}

impl SqliteStateRepository {
    /// Creates a new repository instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Parse a DateTime<Utc> from an ISO 8601 string
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite's own datetime() format
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| {
            CacheError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

fn to_u64(column: &str, value: i64) -> Result<u64, CacheError> {
    u64::try_from(value).map_err(|_| {
        CacheError::SerializationError(format!("Negative value {} in column {}", value, column))
    })
}

fn to_i64(column: &str, value: u64) -> Result<i64, CacheError> {
    i64::try_from(value).map_err(|_| {
        CacheError::SerializationError(format!("Value {} too large for column {}", value, column))
    })
}

// ============================================================================
// Row mapping functions
// ============================================================================

fn association_from_row(row: &SqliteRow) -> Result<Association, CacheError> {
    let id: i64 = row.get("id");
    let local_root: String = row.get("local_root");
    let remote_root: String = row.get("remote_root");

    Association::new(
        AssociationId::new(id),
        PathBuf::from(local_root),
        PathBuf::from(remote_root),
    )
    .map_err(|e| CacheError::SerializationError(format!("Invalid association {}: {}", id, e)))
}

fn catalog_entry_from_row(row: &SqliteRow) -> Result<CatalogEntry, CacheError> {
    let id: i64 = row.get("id");
    let association_id: i64 = row.get("association_id");
    let origin_str: String = row.get("origin");
    let external_id_str: String = row.get("external_id");
    let size: i64 = row.get("size");
    let is_collection: bool = row.get("is_collection");
    let fingerprint: String = row.get("fingerprint");
    let change_version: i64 = row.get("change_version");
    let postponed: bool = row.get("postponed");

    let origin = Origin::from_str(&origin_str)
        .map_err(|e| CacheError::SerializationError(format!("Catalog entry {}: {}", id, e)))?;
    let external_id = ExternalId::new(external_id_str)
        .map_err(|e| CacheError::SerializationError(format!("Catalog entry {}: {}", id, e)))?;

    Ok(CatalogEntry {
        id: CatalogId::new(id),
        association_id: AssociationId::new(association_id),
        origin,
        external_id,
        size: to_u64("size", size)?,
        is_collection,
        fingerprint: Fingerprint::new(fingerprint),
        change_version: ChangeVersion::new(to_u64("change_version", change_version)?),
        postponed,
    })
}

fn link_from_row(row: &SqliteRow) -> Result<Link, CacheError> {
    let id: i64 = row.get("id");
    let association_id: i64 = row.get("association_id");
    let source_id: i64 = row.get("source_id");
    let target_id: i64 = row.get("target_id");
    let change_version: i64 = row.get("change_version");

    Ok(Link {
        id: Some(LinkId::new(id)),
        association_id: AssociationId::new(association_id),
        source_id: CatalogId::new(source_id),
        target_id: CatalogId::new(target_id),
        change_version: ChangeVersion::new(to_u64("change_version", change_version)?),
    })
}

fn diagnostic_from_row(row: &SqliteRow) -> Result<DiagnosticEntry, CacheError> {
    let timestamp: String = row.get("timestamp");
    Ok(DiagnosticEntry {
        id: row.get("id"),
        timestamp: parse_datetime(&timestamp)?,
        message: row.get("message"),
    })
}

// ============================================================================
// Association management (CLI-facing)
// ============================================================================

impl SqliteStateRepository {
    /// Registers a new association and returns it with its generated id
    ///
    /// # Errors
    /// Fails if either root is not absolute or the pair already exists.
    pub async fn add_association(
        &self,
        local_root: &Path,
        remote_root: &Path,
    ) -> anyhow::Result<Association> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("INSERT INTO associations (local_root, remote_root) VALUES (?, ?)")
                .bind(local_root.to_string_lossy().into_owned())
                .bind(remote_root.to_string_lossy().into_owned())
                .execute(&mut *tx)
                .await?;

        // Validation failure drops the transaction, rolling the insert back
        let association = Association::new(
            AssociationId::new(result.last_insert_rowid()),
            local_root,
            remote_root,
        )?;

        tx.commit().await?;

        tracing::debug!(association_id = %association.id(), "Added association");
        Ok(association)
    }

    /// Deletes an association together with its catalog entries and links
    ///
    /// Returns false if no association had that id.
    pub async fn remove_association(&self, id: AssociationId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM associations WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        tracing::debug!(association_id = %id, removed, "Removed association");
        Ok(removed)
    }

    /// Retrieves an association by its id
    pub async fn get_association(&self, id: AssociationId) -> anyhow::Result<Option<Association>> {
        let row = sqlx::query("SELECT * FROM associations WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(association_from_row(r)?)),
            None => Ok(None),
        }
    }

    /// Every catalog entry of the association, ordered by catalog id
    pub async fn catalog_entries(
        &self,
        association_id: AssociationId,
    ) -> anyhow::Result<Vec<CatalogEntry>> {
        let rows = sqlx::query("SELECT * FROM catalog_entries WHERE association_id = ? ORDER BY id")
            .bind(association_id.get())
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(catalog_entry_from_row(row)?);
        }
        Ok(entries)
    }

    /// Catalog entries of the association currently deferred to an
    /// on-demand run
    pub async fn postponed_entries(
        &self,
        association_id: AssociationId,
    ) -> anyhow::Result<Vec<CatalogEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM catalog_entries \
             WHERE association_id = ? AND postponed = 1 ORDER BY id",
        )
        .bind(association_id.get())
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(catalog_entry_from_row(row)?);
        }
        Ok(entries)
    }

    /// Most recent diagnostics entries, newest first
    pub async fn recent_diagnostics(&self, limit: u32) -> anyhow::Result<Vec<DiagnosticEntry>> {
        let rows = sqlx::query("SELECT * FROM diagnostics_log ORDER BY id DESC LIMIT ?")
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(diagnostic_from_row(row)?);
        }
        Ok(entries)
    }
}

// ============================================================================
// Port implementations
// ============================================================================

#[async_trait::async_trait]
impl IAssociationRegistry for SqliteStateRepository {
    async fn list_associations(&self) -> anyhow::Result<Vec<Association>> {
        let rows = sqlx::query("SELECT * FROM associations ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut associations = Vec::with_capacity(rows.len());
        for row in &rows {
            associations.push(association_from_row(row)?);
        }
        Ok(associations)
    }
}

#[async_trait::async_trait]
impl ICatalogStore for SqliteStateRepository {
    async fn find(&self, item: &Item) -> anyhow::Result<Option<CatalogEntry>> {
        let row = sqlx::query(
            "SELECT * FROM catalog_entries \
             WHERE association_id = ? AND origin = ? AND external_id = ?",
        )
        .bind(item.association_id().get())
        .bind(item.origin().as_str())
        .bind(item.external_id().as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(catalog_entry_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, item: &Item) -> anyhow::Result<CatalogId> {
        let result = sqlx::query(
            "INSERT INTO catalog_entries \
             (association_id, origin, external_id, size, is_collection, \
              fingerprint, change_version, postponed) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(item.association_id().get())
        .bind(item.origin().as_str())
        .bind(item.external_id().as_str())
        .bind(to_i64("size", item.size())?)
        .bind(item.is_collection())
        .bind(item.fingerprint().as_str())
        .bind(to_i64("change_version", item.change_version().get())?)
        .bind(item.is_postponed())
        .execute(&self.pool)
        .await?;

        let id = CatalogId::new(result.last_insert_rowid());
        tracing::trace!(
            catalog_id = %id,
            origin = %item.origin(),
            external_id = %item.external_id(),
            "Inserted catalog entry"
        );
        Ok(id)
    }

    async fn update(&self, item: &Item, id: CatalogId) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE catalog_entries SET \
             size = ?, is_collection = ?, fingerprint = ?, change_version = ?, postponed = ? \
             WHERE id = ?",
        )
        .bind(to_i64("size", item.size())?)
        .bind(item.is_collection())
        .bind(item.fingerprint().as_str())
        .bind(to_i64("change_version", item.change_version().get())?)
        .bind(item.is_postponed())
        .bind(id.get())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CacheError::NotFound {
                entity: "catalog entry",
                id: id.get(),
            }
            .into());
        }

        tracing::trace!(catalog_id = %id, version = %item.change_version(), "Updated catalog entry");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ILinkStore for SqliteStateRepository {
    async fn list_links(&self, association_id: AssociationId) -> anyhow::Result<Vec<Link>> {
        let rows = sqlx::query("SELECT * FROM links WHERE association_id = ? ORDER BY id ASC")
            .bind(association_id.get())
            .fetch_all(&self.pool)
            .await?;

        let mut links = Vec::with_capacity(rows.len());
        for row in &rows {
            links.push(link_from_row(row)?);
        }
        Ok(links)
    }

    async fn insert_link(&self, link: &Link) -> anyhow::Result<LinkId> {
        let result = sqlx::query(
            "INSERT INTO links (association_id, source_id, target_id, change_version) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(link.association_id.get())
        .bind(link.source_id.get())
        .bind(link.target_id.get())
        .bind(to_i64("change_version", link.change_version.get())?)
        .execute(&self.pool)
        .await?;

        let id = LinkId::new(result.last_insert_rowid());
        tracing::trace!(
            link_id = %id,
            source_id = %link.source_id,
            target_id = %link.target_id,
            "Inserted link"
        );
        Ok(id)
    }

    async fn update_link(&self, link: &Link, id: LinkId) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE links SET source_id = ?, target_id = ?, change_version = ? WHERE id = ?",
        )
        .bind(link.source_id.get())
        .bind(link.target_id.get())
        .bind(to_i64("change_version", link.change_version.get())?)
        .bind(id.get())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CacheError::NotFound {
                entity: "link",
                id: id.get(),
            }
            .into());
        }

        tracing::trace!(link_id = %id, version = %link.change_version, "Updated link");
        Ok(())
    }
}

#[async_trait::async_trait]
impl IRunStateStore for SqliteStateRepository {
    async fn last_sync(&self) -> anyhow::Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM run_state WHERE key = ?")
            .bind(LAST_SYNC_KEY)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set_last_sync(&self, timestamp: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO run_state (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(LAST_SYNC_KEY)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        tracing::trace!(timestamp, "Stored last sync timestamp");
        Ok(())
    }
}

#[async_trait::async_trait]
impl IDiagnosticsSink for SqliteStateRepository {
    async fn write(&self, message: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO diagnostics_log (timestamp, message) VALUES (?, ?)")
            .bind(Utc::now().to_rfc3339())
            .bind(message)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
