//! Status command - Show last sync time and per-association state

use anyhow::{Context, Result};
use clap::Args;

use dualsync_core::ports::{IAssociationRegistry, IRunStateStore};

use super::CliContext;
use crate::output::get_formatter;

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let store = ctx.open_store().await?;

        let last_sync = store
            .last_sync()
            .await
            .context("Failed to read last sync timestamp")?;
        let associations = store
            .list_associations()
            .await
            .context("Failed to list associations")?;

        let mut rows = Vec::with_capacity(associations.len());
        for association in &associations {
            let entries = store.catalog_entries(association.id()).await?;
            let postponed = entries.iter().filter(|e| e.postponed).count();
            rows.push((association, entries.len(), postponed));
        }

        if ctx.format.is_json() {
            let associations: Vec<_> = rows
                .iter()
                .map(|(a, cataloged, postponed)| {
                    serde_json::json!({
                        "id": a.id(),
                        "local_root": a.local_root(),
                        "remote_root": a.remote_root(),
                        "cataloged": cataloged,
                        "postponed": postponed,
                    })
                })
                .collect();
            formatter.print_json(&serde_json::json!({
                "last_sync": last_sync,
                "database": ctx.config.storage.database,
                "associations": associations,
            }));
            return Ok(());
        }

        match &last_sync {
            Some(at) => formatter.success(&format!("Last sync: {at}")),
            None => formatter.warn("Never synchronized"),
        }
        formatter.info(&format!(
            "Database: {}",
            ctx.config.storage.database.display()
        ));

        for (association, cataloged, postponed) in &rows {
            formatter.info(&format!(
                "[{}] {} <-> {}",
                association.id(),
                association.local_root().display(),
                association.remote_root().display()
            ));
            formatter.info(&format!("    {cataloged} cataloged item(s)"));
            if *postponed > 0 {
                formatter.info(&format!(
                    "    {postponed} large item(s) waiting for a manual sync"
                ));
            }
        }
        Ok(())
    }
}
