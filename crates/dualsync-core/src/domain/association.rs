//! Association domain entity
//!
//! An association pairs one local root with one remote root. Items and links
//! are always scoped to exactly one association.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{errors::DomainError, item::Origin, newtypes::AssociationId};

/// A configured pairing of a local root and a remote root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    id: AssociationId,
    local_root: PathBuf,
    remote_root: PathBuf,
}

impl Association {
    /// Creates an Association from registry data
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRoot` if either root is not absolute
    pub fn new(
        id: AssociationId,
        local_root: impl Into<PathBuf>,
        remote_root: impl Into<PathBuf>,
    ) -> Result<Self, DomainError> {
        let local_root = validate_root(local_root.into())?;
        let remote_root = validate_root(remote_root.into())?;
        Ok(Self {
            id,
            local_root,
            remote_root,
        })
    }

    pub fn id(&self) -> AssociationId {
        self.id
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn remote_root(&self) -> &Path {
        &self.remote_root
    }

    /// Root folder on the given side
    pub fn root_for(&self, origin: Origin) -> &Path {
        match origin {
            Origin::Local => &self.local_root,
            Origin::Remote => &self.remote_root,
        }
    }
}

fn validate_root(path: PathBuf) -> Result<PathBuf, DomainError> {
    if path.as_os_str().is_empty() || !path.is_absolute() {
        return Err(DomainError::InvalidRoot(path.display().to_string()));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_for_each_origin() {
        let assoc =
            Association::new(AssociationId::new(3), "/home/user/Docs", "/mnt/share/Docs").unwrap();

        assert_eq!(assoc.id(), AssociationId::new(3));
        assert_eq!(assoc.root_for(Origin::Local), Path::new("/home/user/Docs"));
        assert_eq!(assoc.root_for(Origin::Remote), Path::new("/mnt/share/Docs"));
    }

    #[test]
    fn test_relative_root_rejected() {
        let result = Association::new(AssociationId::new(1), "Docs", "/mnt/share");
        assert!(matches!(result, Err(DomainError::InvalidRoot(_))));

        let result = Association::new(AssociationId::new(1), "/home/user", "");
        assert!(matches!(result, Err(DomainError::InvalidRoot(_))));
    }
}
