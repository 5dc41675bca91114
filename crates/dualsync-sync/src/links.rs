//! Per-association link resolver
//!
//! Links are loaded once when an association is entered and indexed by both
//! catalog identities. The resolver is a snapshot: links inserted or advanced
//! while the association is processed are only seen on the next run.

use std::collections::HashMap;

use anyhow::Context;

use dualsync_core::domain::{AssociationId, CatalogId, Link};
use dualsync_core::ports::ILinkStore;

pub struct LinkResolver {
    links: Vec<Link>,
    by_catalog_id: HashMap<CatalogId, usize>,
}

impl LinkResolver {
    /// Loads every link of the association from the store
    pub async fn load(store: &dyn ILinkStore, association_id: AssociationId) -> anyhow::Result<Self> {
        let links = store
            .list_links(association_id)
            .await
            .with_context(|| format!("Failed to load links of association {association_id}"))?;
        tracing::debug!(%association_id, links = links.len(), "Loaded links");
        Ok(Self::from_links(links))
    }

    pub fn from_links(links: Vec<Link>) -> Self {
        let mut by_catalog_id = HashMap::with_capacity(links.len() * 2);
        for (index, link) in links.iter().enumerate() {
            // First link wins if the store ever returns overlapping links
            by_catalog_id.entry(link.source_id).or_insert(index);
            by_catalog_id.entry(link.target_id).or_insert(index);
        }
        Self {
            links,
            by_catalog_id,
        }
    }

    /// The link on which `id` appears as either source or target
    pub fn lookup(&self, id: CatalogId) -> Option<&Link> {
        self.by_catalog_id.get(&id).map(|&index| &self.links[index])
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
