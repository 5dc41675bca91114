//! State repository ports (driven/secondary ports)
//!
//! This module defines the interfaces for persisting the catalog, the links
//! between catalog entries, the configured associations and the run state.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, in-memory, etc.) and don't need domain-level classification.
//! - One trait per concern so the engine and tests can substitute each
//!   store independently; the SQLite adapter implements all of them.
//! - Write operations take references to domain entities, allowing the
//!   caller to retain ownership.

use serde::{Deserialize, Serialize};

use crate::domain::{
    newtypes::{AssociationId, CatalogId, ChangeVersion, ExternalId, Fingerprint, LinkId},
    Association, Item, Link, Origin,
};

// ============================================================================
// CatalogEntry
// ============================================================================

/// Persisted form of an [`Item`]
///
/// One entry exists per (association, origin, external identity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: CatalogId,
    pub association_id: AssociationId,
    pub origin: Origin,
    pub external_id: ExternalId,
    pub size: u64,
    pub is_collection: bool,
    pub fingerprint: Fingerprint,
    pub change_version: ChangeVersion,
    pub postponed: bool,
}

// ============================================================================
// Store traits
// ============================================================================

/// Port trait for the item catalog
#[async_trait::async_trait]
pub trait ICatalogStore: Send + Sync {
    /// Finds the entry matching the item's association, origin and external id
    async fn find(&self, item: &Item) -> anyhow::Result<Option<CatalogEntry>>;

    /// Inserts a new entry for the item and returns its generated identity
    async fn insert(&self, item: &Item) -> anyhow::Result<CatalogId>;

    /// Overwrites the entry `id` with the item's current state
    ///
    /// Implementations must fail if no entry with `id` exists.
    async fn update(&self, item: &Item, id: CatalogId) -> anyhow::Result<()>;
}

/// Port trait for links between catalog entries
#[async_trait::async_trait]
pub trait ILinkStore: Send + Sync {
    /// Lists every link belonging to the association
    async fn list_links(&self, association_id: AssociationId) -> anyhow::Result<Vec<Link>>;

    /// Persists a new link and returns its generated identity
    ///
    /// Implementations must reject a link that references a catalog
    /// identity already present in another link.
    async fn insert_link(&self, link: &Link) -> anyhow::Result<LinkId>;

    /// Overwrites the link `id`
    async fn update_link(&self, link: &Link, id: LinkId) -> anyhow::Result<()>;
}

/// Port trait for the configured associations
#[async_trait::async_trait]
pub trait IAssociationRegistry: Send + Sync {
    /// Lists all associations ordered by identity
    async fn list_associations(&self) -> anyhow::Result<Vec<Association>>;
}

/// Port trait for state that outlives a single run
#[async_trait::async_trait]
pub trait IRunStateStore: Send + Sync {
    /// Completion timestamp of the last run, if any
    async fn last_sync(&self) -> anyhow::Result<Option<String>>;

    /// Overwrites the completion timestamp (`yyyy-MM-ddTHH:mm:ssZ`)
    async fn set_last_sync(&self, timestamp: &str) -> anyhow::Result<()>;
}
