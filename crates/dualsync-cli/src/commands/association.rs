//! Association command - Manage local/remote root pairs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use dualsync_core::domain::{AssociationId, Origin};
use dualsync_core::ports::IAssociationRegistry;

use super::CliContext;
use crate::output::get_formatter;

#[derive(Debug, Subcommand)]
pub enum AssociationCommand {
    /// Pair a local folder with a remote folder
    Add {
        /// Local root folder
        local: PathBuf,
        /// Remote root folder (e.g. a mounted share)
        remote: PathBuf,
    },
    /// List configured associations
    List,
    /// Remove an association with its catalog and links
    Remove {
        /// Association id as shown by `association list`
        id: AssociationId,
    },
}

impl AssociationCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            AssociationCommand::Add { local, remote } => execute_add(ctx, local, remote).await,
            AssociationCommand::List => execute_list(ctx).await,
            AssociationCommand::Remove { id } => execute_remove(ctx, *id).await,
        }
    }
}

/// Resolves a user-supplied root to an absolute, existing folder
fn resolve_root(path: &Path, origin: Origin) -> Result<PathBuf> {
    let root = std::fs::canonicalize(path)
        .with_context(|| format!("The {origin} root {} does not exist", path.display()))?;
    if !root.is_dir() {
        anyhow::bail!("The {origin} root {} is not a directory", root.display());
    }
    Ok(root)
}

async fn execute_add(ctx: &CliContext, local: &Path, remote: &Path) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let local = resolve_root(local, Origin::Local)?;
    let remote = resolve_root(remote, Origin::Remote)?;
    if local == remote {
        anyhow::bail!("Local and remote roots must differ");
    }

    let store = ctx.open_store().await?;
    let association = store
        .add_association(&local, &remote)
        .await
        .context("Failed to add association (is this pair already registered?)")?;

    info!(association_id = %association.id(), "Association added");
    if ctx.format.is_json() {
        formatter.print_json(&serde_json::to_value(&association)?);
    } else {
        formatter.success(&format!("Added association {}", association.id()));
        formatter.info(&format!(
            "{} <-> {}",
            association.local_root().display(),
            association.remote_root().display()
        ));
    }
    Ok(())
}

async fn execute_list(ctx: &CliContext) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let store = ctx.open_store().await?;
    let associations = store.list_associations().await?;

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::to_value(&associations)?);
        return Ok(());
    }

    if associations.is_empty() {
        formatter.info("No associations configured. Add one with 'dualsync association add'.");
        return Ok(());
    }
    formatter.success(&format!("{} association(s)", associations.len()));
    for association in &associations {
        formatter.info(&format!(
            "[{}] {} <-> {}",
            association.id(),
            association.local_root().display(),
            association.remote_root().display()
        ));
    }
    Ok(())
}

async fn execute_remove(ctx: &CliContext, id: AssociationId) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let store = ctx.open_store().await?;
    let removed = store.remove_association(id).await?;

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({ "id": id, "removed": removed }));
    } else if removed {
        formatter.success(&format!("Removed association {id}"));
    } else {
        formatter.error(&format!("No association with id {id}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_root_canonicalizes() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();

        let root = resolve_root(&dir.path().join("docs/../docs"), Origin::Local).unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("docs"));
    }

    #[test]
    fn test_resolve_root_rejects_missing_and_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(resolve_root(&dir.path().join("missing"), Origin::Remote).is_err());
        assert!(resolve_root(&file, Origin::Remote).is_err());
    }
}
