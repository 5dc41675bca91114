//! Directory-tree item adapter (secondary/driven adapter)
//!
//! Implements [`IItemAdapter`] over a plain directory using `tokio::fs`. The
//! same adapter serves either side; only its [`Origin`] differs.
//!
//! ## Design Decisions
//!
//! - **External identity**: the `/`-separated path relative to the root.
//! - **Fingerprint**: `{len}:{mtime secs}.{mtime nanos}` for files and the
//!   constant `dir` for folders, so folders only change when created.
//! - **Atomic writes**: files are copied to a sibling temp file and renamed
//!   over the target. Leftover temp files are ignored by listings.

use std::fs::Metadata;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::UNIX_EPOCH;

use dualsync_core::{
    domain::{Association, ExternalId, Fingerprint, Item, Origin},
    ports::IItemAdapter,
};
use tracing::{debug, instrument, warn};

use crate::SyncError;

/// Suffix of in-flight copies
pub const TEMP_SUFFIX: &str = ".dualsync-tmp";

const FOLDER_FINGERPRINT: &str = "dir";

// ============================================================================
// DirectoryAdapter
// ============================================================================

/// Adapter that bridges [`IItemAdapter`] to one side's directory tree
#[derive(Debug, Clone, Copy)]
pub struct DirectoryAdapter {
    origin: Origin,
}

impl DirectoryAdapter {
    #[must_use]
    pub fn new(origin: Origin) -> Self {
        Self { origin }
    }

    #[must_use]
    pub fn local() -> Self {
        Self::new(Origin::Local)
    }

    #[must_use]
    pub fn remote() -> Self {
        Self::new(Origin::Remote)
    }

    fn describe(
        &self,
        association: &Association,
        external_id: ExternalId,
        metadata: &Metadata,
    ) -> Item {
        let (size, fingerprint) = if metadata.is_dir() {
            (0, Fingerprint::new(FOLDER_FINGERPRINT))
        } else {
            (metadata.len(), file_fingerprint(metadata))
        };
        Item::discovered(
            self.origin,
            association.id(),
            external_id,
            size,
            metadata.is_dir(),
            fingerprint,
        )
    }

    /// Depth-first walk emitting each folder before its children
    fn walk<'a>(
        &'a self,
        association: &'a Association,
        dir: PathBuf,
        prefix: Option<String>,
        out: &'a mut Vec<Item>,
    ) -> Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + 'a>> {
        Box::pin(async move {
            let mut entries = Vec::new();
            let mut reader = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = reader.next_entry().await? {
                entries.push(entry);
            }
            entries.sort_by_key(|e| e.file_name());

            for entry in entries {
                let name = match entry.file_name().into_string() {
                    Ok(name) => name,
                    Err(raw) => {
                        warn!(name = ?raw, dir = %dir.display(), "Skipping entry with non-UTF-8 name");
                        continue;
                    }
                };
                if name.ends_with(TEMP_SUFFIX) {
                    continue;
                }

                let metadata = entry.metadata().await?;
                if metadata.file_type().is_symlink() {
                    debug!(%name, "Skipping symbolic link");
                    continue;
                }

                let relative = match &prefix {
                    Some(parent) => format!("{parent}/{name}"),
                    None => name,
                };
                out.push(self.describe(association, ExternalId::new(relative.clone())?, &metadata));

                if metadata.is_dir() {
                    self.walk(association, entry.path(), Some(relative), out)
                        .await?;
                }
            }
            Ok(())
        })
    }

    /// Copies `source` from the opposite root to this side
    async fn materialize(
        &self,
        association: &Association,
        source: &Item,
    ) -> Result<Item, SyncError> {
        let expected = self.origin.opposite();
        if source.origin() != expected {
            return Err(SyncError::OriginMismatch {
                expected,
                actual: source.origin(),
            });
        }

        let from = resolve(association.root_for(source.origin()), source.external_id())?;
        let to = resolve(association.root_for(self.origin), source.external_id())?;

        let source_meta = match tokio::fs::metadata(&from).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(SyncError::PathNotFound(from)),
            Err(e) => return Err(e.into()),
        };

        if source_meta.is_dir() {
            debug!(path = %to.display(), "creating folder");
            tokio::fs::create_dir_all(&to).await?;
        } else {
            if let Some(parent) = to.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let tmp = temp_path(&to);
            debug!(?tmp, "copying to temporary file");
            tokio::fs::copy(&from, &tmp).await?;
            tokio::fs::rename(&tmp, &to).await?;
        }

        let written = tokio::fs::metadata(&to).await?;
        Ok(self.describe(association, source.external_id().clone(), &written))
    }
}

// ============================================================================
// IItemAdapter implementation
// ============================================================================

#[async_trait::async_trait]
impl IItemAdapter for DirectoryAdapter {
    fn origin(&self) -> Origin {
        self.origin
    }

    #[instrument(skip(self, association), fields(origin = %self.origin, association_id = %association.id()))]
    async fn list_items(&self, association: &Association) -> anyhow::Result<Vec<Item>> {
        let root = association.root_for(self.origin);
        if !tokio::fs::try_exists(root).await? {
            return Err(SyncError::PathNotFound(root.to_path_buf()).into());
        }

        let mut items = Vec::new();
        self.walk(association, root.to_path_buf(), None, &mut items)
            .await?;
        debug!(count = items.len(), "listing complete");
        Ok(items)
    }

    #[instrument(skip(self, association, source), fields(origin = %self.origin, external_id = %source.external_id()))]
    async fn create_item(&self, association: &Association, source: &Item) -> anyhow::Result<Item> {
        Ok(self.materialize(association, source).await?)
    }

    #[instrument(skip(self, association, source), fields(origin = %self.origin, external_id = %source.external_id()))]
    async fn update_item(&self, association: &Association, source: &Item) -> anyhow::Result<Item> {
        Ok(self.materialize(association, source).await?)
    }
}

// ============================================================================
// Path helpers
// ============================================================================

/// Joins an external identity onto a root, refusing anything that could
/// leave it
pub fn resolve(root: &Path, external_id: &ExternalId) -> Result<PathBuf, SyncError> {
    let mut path = root.to_path_buf();
    for component in external_id.as_str().split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(SyncError::OutsideRoot(external_id.to_string()));
        }
        path.push(component);
    }
    Ok(path)
}

fn temp_path(target: &Path) -> PathBuf {
    let mut p = target.as_os_str().to_owned();
    p.push(TEMP_SUFFIX);
    PathBuf::from(p)
}

fn file_fingerprint(metadata: &Metadata) -> Fingerprint {
    let modified = metadata
        .modified()
        .ok()
        .and_then(|st| st.duration_since(UNIX_EPOCH).ok())
        .unwrap_or_default();
    Fingerprint::new(format!(
        "{}:{}.{:09}",
        metadata.len(),
        modified.as_secs(),
        modified.subsec_nanos()
    ))
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dualsync_core::domain::AssociationId;
    use tempfile::TempDir;

    struct Sides {
        local: TempDir,
        remote: TempDir,
        association: Association,
    }

    fn sides() -> Sides {
        let local = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        let association =
            Association::new(AssociationId::new(1), local.path(), remote.path()).unwrap();
        Sides {
            local,
            remote,
            association,
        }
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.external_id().as_str()).collect()
    }

    // ------------------------------------------------------------------
    // list_items
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_emits_parents_before_children() {
        let s = sides();
        std::fs::create_dir_all(s.local.path().join("docs/old")).unwrap();
        std::fs::write(s.local.path().join("docs/old/a.txt"), b"a").unwrap();
        std::fs::write(s.local.path().join("docs/b.txt"), b"bb").unwrap();
        std::fs::write(s.local.path().join("top.txt"), b"top").unwrap();

        let items = DirectoryAdapter::local()
            .list_items(&s.association)
            .await
            .unwrap();

        assert_eq!(
            ids(&items),
            vec!["docs", "docs/b.txt", "docs/old", "docs/old/a.txt", "top.txt"]
        );
        assert!(items.iter().all(|i| i.origin() == Origin::Local));
        assert!(items[0].is_collection());
        assert_eq!(items[0].size(), 0);
        assert_eq!(items[1].size(), 2);
    }

    #[tokio::test]
    async fn test_list_skips_temp_files() {
        let s = sides();
        std::fs::write(s.remote.path().join("a.txt"), b"a").unwrap();
        std::fs::write(s.remote.path().join(format!("b.txt{TEMP_SUFFIX}")), b"partial").unwrap();

        let items = DirectoryAdapter::remote()
            .list_items(&s.association)
            .await
            .unwrap();
        assert_eq!(ids(&items), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_list_missing_root_fails() {
        let s = sides();
        let gone = s.remote.path().join("gone");
        let association = Association::new(AssociationId::new(2), s.local.path(), &gone).unwrap();

        let err = DirectoryAdapter::remote()
            .list_items(&association)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Path not found"));
    }

    #[tokio::test]
    async fn test_fingerprint_changes_with_content() {
        let s = sides();
        let path = s.local.path().join("f.txt");
        std::fs::write(&path, b"one").unwrap();
        let adapter = DirectoryAdapter::local();

        let before = adapter.list_items(&s.association).await.unwrap();
        std::fs::write(&path, b"three").unwrap();
        let after = adapter.list_items(&s.association).await.unwrap();

        assert_ne!(before[0].fingerprint(), after[0].fingerprint());
        assert!(after[0].fingerprint().as_str().starts_with("5:"));
    }

    // ------------------------------------------------------------------
    // create_item / update_item
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_copies_file_into_nested_folder() {
        let s = sides();
        std::fs::create_dir_all(s.local.path().join("a/b")).unwrap();
        std::fs::write(s.local.path().join("a/b/note.txt"), b"hello").unwrap();

        let source = DirectoryAdapter::local()
            .list_items(&s.association)
            .await
            .unwrap()
            .into_iter()
            .find(|i| i.external_id().as_str() == "a/b/note.txt")
            .unwrap();

        let counterpart = DirectoryAdapter::remote()
            .create_item(&s.association, &source)
            .await
            .unwrap();

        assert_eq!(counterpart.origin(), Origin::Remote);
        assert_eq!(counterpart.external_id(), source.external_id());
        assert_eq!(counterpart.size(), 5);
        assert_eq!(
            std::fs::read(s.remote.path().join("a/b/note.txt")).unwrap(),
            b"hello"
        );
        assert!(!s.remote.path().join(format!("a/b/note.txt{TEMP_SUFFIX}")).exists());
    }

    #[tokio::test]
    async fn test_create_folder() {
        let s = sides();
        std::fs::create_dir(s.remote.path().join("photos")).unwrap();
        let source = DirectoryAdapter::remote()
            .list_items(&s.association)
            .await
            .unwrap()
            .remove(0);

        let counterpart = DirectoryAdapter::local()
            .create_item(&s.association, &source)
            .await
            .unwrap();

        assert!(counterpart.is_collection());
        assert!(s.local.path().join("photos").is_dir());
    }

    #[tokio::test]
    async fn test_update_overwrites_existing() {
        let s = sides();
        std::fs::write(s.local.path().join("f.txt"), b"new content").unwrap();
        std::fs::write(s.remote.path().join("f.txt"), b"old").unwrap();
        let source = DirectoryAdapter::local()
            .list_items(&s.association)
            .await
            .unwrap()
            .remove(0);

        DirectoryAdapter::remote()
            .update_item(&s.association, &source)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read(s.remote.path().join("f.txt")).unwrap(),
            b"new content"
        );
    }

    #[tokio::test]
    async fn test_rejects_source_of_own_origin() {
        let s = sides();
        std::fs::write(s.local.path().join("f.txt"), b"x").unwrap();
        let source = DirectoryAdapter::local()
            .list_items(&s.association)
            .await
            .unwrap()
            .remove(0);

        let err = DirectoryAdapter::local()
            .create_item(&s.association, &source)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::OriginMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_source_is_reported() {
        let s = sides();
        let source = Item::discovered(
            Origin::Local,
            AssociationId::new(1),
            ExternalId::new("vanished.txt").unwrap(),
            1,
            false,
            Fingerprint::new("1:0.000000000"),
        );

        let err = DirectoryAdapter::remote()
            .create_item(&s.association, &source)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::PathNotFound(_))
        ));
    }

    // ------------------------------------------------------------------
    // resolve
    // ------------------------------------------------------------------

    #[test]
    fn test_resolve_joins_components() {
        let id = ExternalId::new("a/b/c.txt").unwrap();
        assert_eq!(
            resolve(Path::new("/root"), &id).unwrap(),
            PathBuf::from("/root/a/b/c.txt")
        );
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        for bad in ["../etc/passwd", "a/../../b", "/abs", "a//b", "./a"] {
            let id = ExternalId::new(bad).unwrap();
            assert!(
                matches!(resolve(Path::new("/root"), &id), Err(SyncError::OutsideRoot(_))),
                "{bad} should be rejected"
            );
        }
    }
}
