//! Reconciliation engine
//!
//! The [`ReconciliationEngine`] propagates creations and modifications
//! between the local and the remote side of every configured association.
//!
//! ## Run Flow
//!
//! 1. **Scan**: list remote items, then local items, into one merged list
//! 2. **Catalog**: upsert the list, assigning identities and change versions
//! 3. **Links**: load the association's links once
//! 4. **Process**: per item decide Insert / Update / no-op and write through
//!    the adapter of the opposite side; failures are isolated per item
//! 5. **Bookkeeping**: notify the summary and store the completion timestamp
//!
//! ## Time Budget
//!
//! The budget is checked before every association. In time-boxed runs it is
//! also checked after every item, and items above
//! [`LARGE_OBJECT_THRESHOLD`] are postponed to an on-demand run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use dualsync_audit::DiagnosticsLogger;
use dualsync_core::domain::{Association, CatalogId, Item, Link, Origin, RunMode};
use dualsync_core::ports::{
    IAssociationRegistry, ICatalogStore, IItemAdapter, ILinkStore, INotificationService,
    IRunStateStore, Notification,
};

use crate::budget::{Deadline, TIME_BUDGET};
use crate::catalog::CatalogIndex;
use crate::links::LinkResolver;
use crate::summary::{format_last_sync, RunSummary, TransferCounters};
use crate::SyncError;

/// Items larger than this are postponed in time-boxed runs (50 MiB)
pub const LARGE_OBJECT_THRESHOLD: u64 = 50 * 1024 * 1024;

// ============================================================================
// Collaborators
// ============================================================================

/// The two item adapters of the engine
pub struct Adapters {
    local: Arc<dyn IItemAdapter>,
    remote: Arc<dyn IItemAdapter>,
}

impl Adapters {
    /// # Errors
    /// Returns `SyncError::OriginMismatch` if an adapter serves the wrong side
    pub fn new(
        local: Arc<dyn IItemAdapter>,
        remote: Arc<dyn IItemAdapter>,
    ) -> Result<Self, SyncError> {
        for (adapter, expected) in [(&local, Origin::Local), (&remote, Origin::Remote)] {
            if adapter.origin() != expected {
                return Err(SyncError::OriginMismatch {
                    expected,
                    actual: adapter.origin(),
                });
            }
        }
        Ok(Self { local, remote })
    }

    /// The adapter that lists items of `origin`
    pub fn reader_for(&self, origin: Origin) -> &dyn IItemAdapter {
        match origin {
            Origin::Local => self.local.as_ref(),
            Origin::Remote => self.remote.as_ref(),
        }
    }

    /// The adapter that materialises counterparts of items of `origin`
    ///
    /// Local items are written to the remote side and remote items to the
    /// local side. Insert and Update both dispatch through here.
    pub fn writer_for(&self, origin: Origin) -> &dyn IItemAdapter {
        self.reader_for(origin.opposite())
    }
}

/// Persistence collaborators
pub struct Stores {
    pub catalog: Arc<dyn ICatalogStore>,
    pub links: Arc<dyn ILinkStore>,
    pub associations: Arc<dyn IAssociationRegistry>,
    pub run_state: Arc<dyn IRunStateStore>,
}

impl Stores {
    /// Uses one store that implements every port for all of them
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: ICatalogStore + ILinkStore + IAssociationRegistry + IRunStateStore + 'static,
    {
        Self {
            catalog: store.clone(),
            links: store.clone(),
            associations: store.clone(),
            run_state: store,
        }
    }
}

// ============================================================================
// Decision
// ============================================================================

/// What to do with one cataloged item
#[derive(Debug, PartialEq, Eq)]
pub enum Decision<'a> {
    /// No counterpart is known yet
    Insert,
    /// The item changed since the link was last propagated
    Update(&'a Link),
    /// Nothing to propagate
    Unchanged,
}

/// Decides from the item's version and its link, if any
pub fn decide<'a>(item: &Item, link: Option<&'a Link>) -> Decision<'a> {
    match link {
        None => Decision::Insert,
        Some(link) if item.change_version() > link.change_version => Decision::Update(link),
        Some(_) => Decision::Unchanged,
    }
}

// ============================================================================
// RunContext
// ============================================================================

/// Mutable state of one run
struct RunContext {
    mode: RunMode,
    deadline: Deadline,
    counters: TransferCounters,
    failures: u32,
    associations_processed: u32,
    stopped_early: bool,
    /// Catalog entries linked by an Insert earlier in this run
    linked_this_run: HashSet<CatalogId>,
}

impl RunContext {
    fn new(mode: RunMode, deadline: Deadline) -> Self {
        Self {
            mode,
            deadline,
            counters: TransferCounters::default(),
            failures: 0,
            associations_processed: 0,
            stopped_early: false,
            linked_this_run: HashSet::new(),
        }
    }

    fn finish(self) -> RunSummary {
        RunSummary {
            mode: self.mode,
            counters: self.counters,
            failures: self.failures,
            associations_processed: self.associations_processed,
            stopped_early: self.stopped_early,
            duration_ms: self.deadline.elapsed().as_millis() as u64,
            completed_at: format_last_sync(Utc::now()),
        }
    }
}

// ============================================================================
// ReconciliationEngine
// ============================================================================

pub struct ReconciliationEngine {
    adapters: Adapters,
    stores: Stores,
    catalog: CatalogIndex,
    notifier: Arc<dyn INotificationService>,
    diagnostics: DiagnosticsLogger,
    time_budget: Duration,
    large_object_threshold: u64,
}

impl ReconciliationEngine {
    pub fn new(
        adapters: Adapters,
        stores: Stores,
        notifier: Arc<dyn INotificationService>,
        diagnostics: DiagnosticsLogger,
    ) -> Self {
        let catalog = CatalogIndex::new(Arc::clone(&stores.catalog));
        Self {
            adapters,
            stores,
            catalog,
            notifier,
            diagnostics,
            time_budget: TIME_BUDGET,
            large_object_threshold: LARGE_OBJECT_THRESHOLD,
        }
    }

    /// Overrides [`TIME_BUDGET`]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Overrides [`LARGE_OBJECT_THRESHOLD`]
    pub fn with_large_object_threshold(mut self, bytes: u64) -> Self {
        self.large_object_threshold = bytes;
        self
    }

    /// Runs one reconciliation cycle over every association
    ///
    /// # Errors
    /// Fails if associations cannot be listed, if an association cannot be
    /// scanned, cataloged or its links loaded, or if the completion
    /// timestamp cannot be stored. Individual item failures are reported and
    /// do not fail the run.
    #[tracing::instrument(skip(self, mode), fields(mode = %mode))]
    pub async fn run(&self, mode: RunMode) -> Result<RunSummary> {
        let mut ctx = RunContext::new(mode, Deadline::start(self.time_budget));

        info!("Starting reconciliation run");
        self.diagnostics.log_run_start(mode).await;

        let associations = self
            .stores
            .associations
            .list_associations()
            .await
            .context("Failed to list associations")?;

        for association in &associations {
            if ctx.deadline.is_exhausted() {
                self.stop_for_budget(association, &mut ctx).await;
                break;
            }

            self.reconcile_association(association, &mut ctx)
                .await
                .with_context(|| format!("Failed to reconcile association {}", association.id()))?;

            if ctx.stopped_early {
                break;
            }
        }

        let summary = ctx.finish();
        self.diagnostics
            .log_run_complete(
                summary.mode,
                summary.duration(),
                summary.counters.uploads,
                summary.counters.downloads,
                summary.failures,
                summary.stopped_early,
            )
            .await;

        if let Err(e) = self.notifier.notify(&summary.notification()).await {
            warn!(error = %e, "Failed to deliver summary notification");
        }

        self.stores
            .run_state
            .set_last_sync(&summary.completed_at)
            .await
            .context("Failed to store last sync timestamp")?;

        info!(
            uploads = summary.counters.uploads,
            downloads = summary.counters.downloads,
            failures = summary.failures,
            stopped_early = summary.stopped_early,
            duration_ms = summary.duration_ms,
            "Reconciliation run finished"
        );

        Ok(summary)
    }

    async fn stop_for_budget(&self, association: &Association, ctx: &mut RunContext) {
        ctx.stopped_early = true;
        let elapsed = ctx.deadline.elapsed();
        warn!(
            elapsed_secs = elapsed.as_secs(),
            association_id = %association.id(),
            "Time budget exhausted, deferring remaining work to the next run"
        );
        self.diagnostics
            .log_budget_stop(elapsed, association.id())
            .await;
    }

    // ========================================================================
    // Association processing
    // ========================================================================

    #[tracing::instrument(skip(self, association, ctx), fields(association_id = %association.id()))]
    async fn reconcile_association(
        &self,
        association: &Association,
        ctx: &mut RunContext,
    ) -> Result<()> {
        self.diagnostics.log_association(association).await;

        let mut items = self.scan(association, Origin::Remote).await?;
        let remote_count = items.len();
        items.extend(self.scan(association, Origin::Local).await?);
        let local_count = items.len() - remote_count;

        info!(remote = remote_count, local = local_count, "Scanned association");
        self.diagnostics
            .log_scan(association.id(), remote_count, local_count)
            .await;

        self.catalog
            .upsert_snapshot(&mut items)
            .await
            .context("Failed to update the catalog")?;

        let links = LinkResolver::load(self.stores.links.as_ref(), association.id()).await?;
        ctx.associations_processed += 1;

        for item in items.iter_mut() {
            if let Err(err) = self.process_item(association, item, &links, ctx).await {
                ctx.failures += 1;
                self.report_failure(item, &err).await;
            }

            if ctx.mode.is_time_boxed() && ctx.deadline.is_exhausted() {
                self.stop_for_budget(association, ctx).await;
                break;
            }
        }

        Ok(())
    }

    /// Lists one side and checks that the adapter reported only its own items
    async fn scan(&self, association: &Association, origin: Origin) -> Result<Vec<Item>> {
        let items = self
            .adapters
            .reader_for(origin)
            .list_items(association)
            .await
            .with_context(|| format!("Failed to list {origin} items"))?;

        if let Some(stray) = items.iter().find(|i| i.origin() != origin) {
            return Err(SyncError::OriginMismatch {
                expected: origin,
                actual: stray.origin(),
            })
            .with_context(|| format!("Adapter listed {} on the wrong side", stray.external_id()));
        }
        Ok(items)
    }

    // ========================================================================
    // Item processing
    // ========================================================================

    #[tracing::instrument(
        skip(self, association, item, links, ctx),
        fields(external_id = %item.external_id(), origin = %item.origin())
    )]
    async fn process_item(
        &self,
        association: &Association,
        item: &mut Item,
        links: &LinkResolver,
        ctx: &mut RunContext,
    ) -> Result<()> {
        let source_id = item.require_catalog_id()?;

        // Counterpart of an item inserted earlier in this run; `links` predates it
        if ctx.linked_this_run.contains(&source_id) {
            debug!(catalog_id = %source_id, "Already linked earlier in this run");
            return Ok(());
        }

        if ctx.mode.is_time_boxed() && item.size() > self.large_object_threshold {
            if item.mark_postponed() {
                self.stores
                    .catalog
                    .update(item, source_id)
                    .await
                    .context("Failed to persist postponed flag")?;
            }
            debug!(size = item.size(), "Postponed large item to an on-demand run");
            return Ok(());
        }

        match decide(item, links.lookup(source_id)) {
            Decision::Insert => self.insert(association, item, ctx).await,
            Decision::Update(link) => self.update(association, item, link.clone(), ctx).await,
            Decision::Unchanged => Ok(()),
        }
    }

    async fn insert(
        &self,
        association: &Association,
        item: &mut Item,
        ctx: &mut RunContext,
    ) -> Result<()> {
        let source_id = item.require_catalog_id()?;
        let writer = self.adapters.writer_for(item.origin());

        debug!(side = %writer.origin(), "Creating counterpart");
        let mut counterpart = writer
            .create_item(association, item)
            .await
            .with_context(|| format!("Failed to create counterpart of {}", item.external_id()))?;
        check_counterpart(&counterpart, writer.origin())?;
        ctx.counters.record_write(writer.origin(), item.is_collection());

        if item.clear_postponed() {
            self.stores
                .catalog
                .update(item, source_id)
                .await
                .context("Failed to clear postponed flag")?;
        }

        let counterpart_id = self
            .catalog
            .register_counterpart(&mut counterpart, item.change_version())
            .await?;

        let link = Link::new(
            association.id(),
            source_id,
            counterpart_id,
            item.change_version(),
        );
        let link_id = self
            .stores
            .links
            .insert_link(&link)
            .await
            .context("Failed to persist link")?;
        ctx.linked_this_run.extend([source_id, counterpart_id]);

        debug!(%link_id, %counterpart_id, "Linked new counterpart");
        Ok(())
    }

    async fn update(
        &self,
        association: &Association,
        item: &mut Item,
        mut link: Link,
        ctx: &mut RunContext,
    ) -> Result<()> {
        let source_id = item.require_catalog_id()?;
        let counterpart_id = link
            .counterpart_of(source_id)
            .with_context(|| format!("Link does not reference catalog entry {source_id}"))?;
        let link_id = link
            .id
            .with_context(|| format!("Link of catalog entry {source_id} has no identity"))?;
        let writer = self.adapters.writer_for(item.origin());

        debug!(
            side = %writer.origin(),
            from = %link.change_version,
            to = %item.change_version(),
            "Updating counterpart"
        );
        let mut counterpart = writer
            .update_item(association, item)
            .await
            .with_context(|| format!("Failed to update counterpart of {}", item.external_id()))?;
        check_counterpart(&counterpart, writer.origin())?;
        ctx.counters.record_write(writer.origin(), item.is_collection());

        item.clear_postponed();
        counterpart.set_catalog_id(counterpart_id);
        counterpart.set_change_version(item.change_version());

        self.stores
            .catalog
            .update(item, source_id)
            .await
            .context("Failed to persist source entry")?;
        self.stores
            .catalog
            .update(&counterpart, counterpart_id)
            .await
            .context("Failed to persist counterpart entry")?;

        link.advance_to(item.change_version());
        self.stores
            .links
            .update_link(&link, link_id)
            .await
            .context("Failed to advance link")?;

        Ok(())
    }

    /// Exactly one notification and one diagnostics entry per failed item
    async fn report_failure(&self, item: &Item, err: &anyhow::Error) {
        error!(
            external_id = %item.external_id(),
            origin = %item.origin(),
            error = %format!("{err:#}"),
            "Item reconciliation failed"
        );

        let notification = Notification::error(
            "Synchronization error",
            format!("Message: {err:#}, EntityId: {}", item.external_id()),
        );
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(error = %e, "Failed to deliver failure notification");
        }

        self.diagnostics
            .log_item_failure(item.external_id(), err)
            .await;
    }
}

fn check_counterpart(counterpart: &Item, expected: Origin) -> Result<(), SyncError> {
    if counterpart.origin() != expected {
        return Err(SyncError::OriginMismatch {
            expected,
            actual: counterpart.origin(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualsync_core::domain::{
        AssociationId, CatalogId, ChangeVersion, ExternalId, Fingerprint, LinkId,
    };

    fn cataloged(version: u64) -> Item {
        let mut item = Item::discovered(
            Origin::Local,
            AssociationId::new(1),
            ExternalId::new("a.txt").unwrap(),
            1,
            false,
            Fingerprint::new("f"),
        );
        item.set_catalog_id(CatalogId::new(1));
        item.set_change_version(ChangeVersion::new(version));
        item
    }

    fn link(version: u64) -> Link {
        let mut link = Link::new(
            AssociationId::new(1),
            CatalogId::new(1),
            CatalogId::new(2),
            ChangeVersion::new(version),
        );
        link.id = Some(LinkId::new(1));
        link
    }

    #[test]
    fn test_decide_without_link_inserts() {
        assert_eq!(decide(&cataloged(0), None), Decision::Insert);
    }

    #[test]
    fn test_decide_newer_item_updates() {
        let l = link(2);
        assert_eq!(decide(&cataloged(3), Some(&l)), Decision::Update(&l));
    }

    #[test]
    fn test_decide_same_or_older_item_is_unchanged() {
        let l = link(3);
        assert_eq!(decide(&cataloged(3), Some(&l)), Decision::Unchanged);
        assert_eq!(decide(&cataloged(1), Some(&l)), Decision::Unchanged);
    }

    #[test]
    fn test_check_counterpart_origin() {
        let item = cataloged(0);
        assert!(check_counterpart(&item, Origin::Local).is_ok());
        assert!(matches!(
            check_counterpart(&item, Origin::Remote),
            Err(SyncError::OriginMismatch { .. })
        ));
    }

    #[test]
    fn test_large_object_threshold_is_50_mib() {
        assert_eq!(LARGE_OBJECT_THRESHOLD, 52_428_800);
    }
}
