//! Item catalog upsert
//!
//! Reconciles freshly listed items against the persistent catalog. Each item
//! leaves with its catalog identity and a change version that is bumped by
//! exactly one whenever the origin fingerprint differs from the stored one.

use std::sync::Arc;

use anyhow::Context;

use dualsync_core::domain::{CatalogId, ChangeVersion, Item};
use dualsync_core::ports::{CatalogEntry, ICatalogStore};

/// Version an item should carry given its stored entry
fn resolved_version(entry: &CatalogEntry, item: &Item) -> ChangeVersion {
    if entry.fingerprint != *item.fingerprint() {
        entry.change_version.next()
    } else {
        entry.change_version
    }
}

/// True if persisting `item` would change the stored entry
fn differs(entry: &CatalogEntry, item: &Item) -> bool {
    entry.fingerprint != *item.fingerprint()
        || entry.change_version != item.change_version()
        || entry.size != item.size()
        || entry.is_collection != item.is_collection()
        || entry.postponed != item.is_postponed()
}

pub struct CatalogIndex {
    store: Arc<dyn ICatalogStore>,
}

impl CatalogIndex {
    pub fn new(store: Arc<dyn ICatalogStore>) -> Self {
        Self { store }
    }

    /// Upserts every item of a merged snapshot
    ///
    /// The stored postponed flag is carried onto the item so a later write
    /// can clear it. Entries are only rewritten when something changed.
    pub async fn upsert_snapshot(&self, items: &mut [Item]) -> anyhow::Result<()> {
        for item in items.iter_mut() {
            let existing = self.store.find(item).await.with_context(|| {
                format!("Failed to look up catalog entry for {}", item.external_id())
            })?;

            match existing {
                None => {
                    let id = self.store.insert(item).await.with_context(|| {
                        format!("Failed to catalog {}", item.external_id())
                    })?;
                    item.set_catalog_id(id);
                    tracing::trace!(catalog_id = %id, external_id = %item.external_id(), "New catalog entry");
                }
                Some(entry) => {
                    item.set_change_version(resolved_version(&entry, item));
                    if entry.postponed {
                        item.mark_postponed();
                    }
                    item.set_catalog_id(entry.id);
                    if differs(&entry, item) {
                        self.store.update(item, entry.id).await.with_context(|| {
                            format!("Failed to update catalog entry {}", entry.id)
                        })?;
                        tracing::trace!(
                            catalog_id = %entry.id,
                            version = %item.change_version(),
                            "Catalog entry changed"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Catalogs a counterpart just written by an adapter
    ///
    /// An existing entry for the same (association, origin, external id) is
    /// updated in place and its identity reused. The counterpart's version is
    /// raised to at least `source_version` and never decreases.
    pub async fn register_counterpart(
        &self,
        counterpart: &mut Item,
        source_version: ChangeVersion,
    ) -> anyhow::Result<CatalogId> {
        let existing = self.store.find(counterpart).await.with_context(|| {
            format!("Failed to look up catalog entry for {}", counterpart.external_id())
        })?;

        let id = match existing {
            None => {
                counterpart.set_change_version(source_version);
                self.store.insert(counterpart).await.with_context(|| {
                    format!("Failed to catalog counterpart {}", counterpart.external_id())
                })?
            }
            Some(entry) => {
                let version = resolved_version(&entry, counterpart).max(source_version);
                counterpart.set_change_version(version);
                counterpart.set_catalog_id(entry.id);
                if differs(&entry, counterpart) {
                    self.store.update(counterpart, entry.id).await.with_context(|| {
                        format!("Failed to update catalog entry {}", entry.id)
                    })?;
                }
                entry.id
            }
        };
        counterpart.set_catalog_id(id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use dualsync_core::domain::{AssociationId, ExternalId, Fingerprint, Origin};

    /// In-memory catalog that counts writes
    #[derive(Default)]
    struct MemoryCatalog {
        entries: Mutex<Vec<CatalogEntry>>,
        writes: Mutex<u32>,
    }

    impl MemoryCatalog {
        fn writes(&self) -> u32 {
            *self.writes.lock().unwrap()
        }
    }

    fn entry_for(id: CatalogId, item: &Item) -> CatalogEntry {
        CatalogEntry {
            id,
            association_id: item.association_id(),
            origin: item.origin(),
            external_id: item.external_id().clone(),
            size: item.size(),
            is_collection: item.is_collection(),
            fingerprint: item.fingerprint().clone(),
            change_version: item.change_version(),
            postponed: item.is_postponed(),
        }
    }

    #[async_trait]
    impl ICatalogStore for MemoryCatalog {
        async fn find(&self, item: &Item) -> anyhow::Result<Option<CatalogEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .find(|e| {
                    e.association_id == item.association_id()
                        && e.origin == item.origin()
                        && &e.external_id == item.external_id()
                })
                .cloned())
        }

        async fn insert(&self, item: &Item) -> anyhow::Result<CatalogId> {
            let mut entries = self.entries.lock().unwrap();
            let id = CatalogId::new(entries.len() as i64 + 1);
            entries.push(entry_for(id, item));
            *self.writes.lock().unwrap() += 1;
            Ok(id)
        }

        async fn update(&self, item: &Item, id: CatalogId) -> anyhow::Result<()> {
            let mut entries = self.entries.lock().unwrap();
            let slot = entries
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| anyhow::anyhow!("no entry {id}"))?;
            *slot = entry_for(id, item);
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn item(origin: Origin, path: &str, fingerprint: &str) -> Item {
        Item::discovered(
            origin,
            AssociationId::new(1),
            ExternalId::new(path).unwrap(),
            10,
            false,
            Fingerprint::new(fingerprint),
        )
    }

    #[tokio::test]
    async fn test_new_items_get_identity_and_initial_version() {
        let store = Arc::new(MemoryCatalog::default());
        let index = CatalogIndex::new(store.clone());

        let mut items = vec![item(Origin::Remote, "a", "f1"), item(Origin::Local, "a", "f1")];
        index.upsert_snapshot(&mut items).await.unwrap();

        assert_eq!(items[0].catalog_id(), Some(CatalogId::new(1)));
        assert_eq!(items[1].catalog_id(), Some(CatalogId::new(2)));
        assert!(items.iter().all(|i| i.change_version() == ChangeVersion::INITIAL));
    }

    #[tokio::test]
    async fn test_version_bumps_only_on_fingerprint_change() {
        let store = Arc::new(MemoryCatalog::default());
        let index = CatalogIndex::new(store.clone());

        let mut first = vec![item(Origin::Local, "a", "f1")];
        index.upsert_snapshot(&mut first).await.unwrap();

        let mut unchanged = vec![item(Origin::Local, "a", "f1")];
        index.upsert_snapshot(&mut unchanged).await.unwrap();
        assert_eq!(unchanged[0].change_version(), ChangeVersion::INITIAL);
        assert_eq!(store.writes(), 1, "unchanged item must not be rewritten");

        let mut changed = vec![item(Origin::Local, "a", "f2")];
        index.upsert_snapshot(&mut changed).await.unwrap();
        assert_eq!(changed[0].change_version(), ChangeVersion::new(1));
        assert_eq!(changed[0].catalog_id(), first[0].catalog_id());

        let mut changed_again = vec![item(Origin::Local, "a", "f3")];
        index.upsert_snapshot(&mut changed_again).await.unwrap();
        assert_eq!(changed_again[0].change_version(), ChangeVersion::new(2));
    }

    #[tokio::test]
    async fn test_stored_postponed_flag_is_carried() {
        let store = Arc::new(MemoryCatalog::default());
        let index = CatalogIndex::new(store.clone());

        let mut postponed = item(Origin::Remote, "big.iso", "f");
        postponed.mark_postponed();
        store.insert(&postponed).await.unwrap();

        let mut items = vec![item(Origin::Remote, "big.iso", "f")];
        index.upsert_snapshot(&mut items).await.unwrap();
        assert!(items[0].is_postponed());
    }

    #[tokio::test]
    async fn test_register_new_counterpart_takes_source_version() {
        let store = Arc::new(MemoryCatalog::default());
        let index = CatalogIndex::new(store.clone());

        let mut counterpart = item(Origin::Remote, "a", "copy");
        let id = index
            .register_counterpart(&mut counterpart, ChangeVersion::new(3))
            .await
            .unwrap();

        assert_eq!(counterpart.catalog_id(), Some(id));
        assert_eq!(counterpart.change_version(), ChangeVersion::new(3));
    }

    #[tokio::test]
    async fn test_register_existing_counterpart_reuses_identity() {
        let store = Arc::new(MemoryCatalog::default());
        let index = CatalogIndex::new(store.clone());

        let mut existing = item(Origin::Remote, "a", "old");
        existing.set_change_version(ChangeVersion::new(7));
        let existing_id = store.insert(&existing).await.unwrap();

        let mut counterpart = item(Origin::Remote, "a", "new");
        let id = index
            .register_counterpart(&mut counterpart, ChangeVersion::new(2))
            .await
            .unwrap();

        assert_eq!(id, existing_id);
        // 7 + 1 for the fingerprint change; never lowered to the source's 2
        assert_eq!(counterpart.change_version(), ChangeVersion::new(8));
        let stored = store.find(&counterpart).await.unwrap().unwrap();
        assert_eq!(stored.fingerprint, Fingerprint::new("new"));
    }
}
