//! Item domain entity
//!
//! An [`Item`] describes one file or folder as reported by one side of an
//! association. The side that produced it is its [`Origin`] and never changes
//! after construction; every write decision in the engine keys off it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;
use super::newtypes::{AssociationId, CatalogId, ChangeVersion, ExternalId, Fingerprint};

// ============================================================================
// Origin
// ============================================================================

/// Which side of an association an item was reported by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The local folder tree
    Local,
    /// The remote folder tree
    Remote,
}

impl Origin {
    /// The other side of the association
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Origin::Local => Origin::Remote,
            Origin::Remote => Origin::Local,
        }
    }

    /// Stable lowercase name used for persistence
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Origin::Local => "local",
            Origin::Remote => "remote",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Origin::Local),
            "remote" => Ok(Origin::Remote),
            other => Err(DomainError::ValidationFailed(format!(
                "Unknown origin '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Item
// ============================================================================

/// A file or folder descriptor reported by an origin adapter
///
/// Freshly discovered items carry no catalog identity and version zero; the
/// catalog fills both in during upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    origin: Origin,
    association_id: AssociationId,
    external_id: ExternalId,
    catalog_id: Option<CatalogId>,
    size: u64,
    is_collection: bool,
    fingerprint: Fingerprint,
    change_version: ChangeVersion,
    postponed: bool,
}

impl Item {
    /// Describe an item as an adapter reports it during a listing or write
    #[must_use]
    pub fn discovered(
        origin: Origin,
        association_id: AssociationId,
        external_id: ExternalId,
        size: u64,
        is_collection: bool,
        fingerprint: Fingerprint,
    ) -> Self {
        Self {
            origin,
            association_id,
            external_id,
            catalog_id: None,
            size,
            is_collection,
            fingerprint,
            change_version: ChangeVersion::INITIAL,
            postponed: false,
        }
    }

    // --- accessors ---

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn association_id(&self) -> AssociationId {
        self.association_id
    }

    pub fn external_id(&self) -> &ExternalId {
        &self.external_id
    }

    pub fn catalog_id(&self) -> Option<CatalogId> {
        self.catalog_id
    }

    /// Size in bytes; zero for collections
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_collection(&self) -> bool {
        self.is_collection
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn change_version(&self) -> ChangeVersion {
        self.change_version
    }

    /// True while the item is deferred to a later on-demand cycle
    pub fn is_postponed(&self) -> bool {
        self.postponed
    }

    /// Catalog identity, required once the item has been through upsert
    ///
    /// # Errors
    /// Returns `DomainError::Untracked` if the catalog never assigned one
    pub fn require_catalog_id(&self) -> Result<CatalogId, DomainError> {
        self.catalog_id
            .ok_or_else(|| DomainError::Untracked(self.external_id.to_string()))
    }

    // --- catalog-owned state ---

    pub fn set_catalog_id(&mut self, id: CatalogId) {
        self.catalog_id = Some(id);
    }

    pub fn set_change_version(&mut self, version: ChangeVersion) {
        self.change_version = version;
    }

    /// Mark the item as deferred. Returns true when the flag changed.
    pub fn mark_postponed(&mut self) -> bool {
        let changed = !self.postponed;
        self.postponed = true;
        changed
    }

    /// Clear the deferral flag. Returns true when the flag changed.
    pub fn clear_postponed(&mut self) -> bool {
        let changed = self.postponed;
        self.postponed = false;
        changed
    }
}
