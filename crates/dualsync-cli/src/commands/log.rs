//! Log command - View recent diagnostics entries

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::CliContext;
use crate::output::get_formatter;

#[derive(Debug, Args)]
pub struct LogCommand {
    /// Maximum number of entries to show
    #[arg(long, default_value = "20")]
    pub limit: u32,
}

impl LogCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let store = ctx.open_store().await?;

        let entries = store
            .recent_diagnostics(self.limit)
            .await
            .context("Failed to query diagnostics log")?;
        info!(count = entries.len(), "Retrieved diagnostics entries");

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            formatter.info("No diagnostics recorded yet");
            return Ok(());
        }

        // Oldest first reads naturally in a terminal
        for entry in entries.iter().rev() {
            let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
            let mut lines = entry.message.lines();
            if let Some(first) = lines.next() {
                formatter.info(&format!("{timestamp}  {first}"));
            }
            for continuation in lines {
                formatter.info(&format!("                     {continuation}"));
            }
        }
        Ok(())
    }
}
