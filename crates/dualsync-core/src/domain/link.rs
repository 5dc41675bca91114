//! Link domain entity
//!
//! A link records that two catalog entries of one association are
//! counterparts, together with the change version last propagated between
//! them. Links are symmetric: either side may be the current change source.

use serde::{Deserialize, Serialize};

use super::newtypes::{AssociationId, CatalogId, ChangeVersion, LinkId};

/// A versioned pairing of two catalog entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Store identity; `None` until the link is persisted
    pub id: Option<LinkId>,
    pub association_id: AssociationId,
    /// Catalog id of the item whose change created the link
    pub source_id: CatalogId,
    /// Catalog id of the counterpart written by the engine
    pub target_id: CatalogId,
    /// Last change version propagated across this link
    pub change_version: ChangeVersion,
}

impl Link {
    /// A new, not yet persisted link
    #[must_use]
    pub fn new(
        association_id: AssociationId,
        source_id: CatalogId,
        target_id: CatalogId,
        change_version: ChangeVersion,
    ) -> Self {
        Self {
            id: None,
            association_id,
            source_id,
            target_id,
            change_version,
        }
    }

    /// True if the catalog id is on either side of the link
    pub fn involves(&self, id: CatalogId) -> bool {
        self.source_id == id || self.target_id == id
    }

    /// The other side of the link, or `None` if `id` is not part of it
    pub fn counterpart_of(&self, id: CatalogId) -> Option<CatalogId> {
        if self.source_id == id {
            Some(self.target_id)
        } else if self.target_id == id {
            Some(self.source_id)
        } else {
            None
        }
    }

    /// Record that `version` has been propagated
    pub fn advance_to(&mut self, version: ChangeVersion) {
        self.change_version = version;
    }
}
