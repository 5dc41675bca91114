//! Item adapter port (driven/secondary port)
//!
//! An item adapter fronts one side of every association. It lists the items
//! currently present on its side and materialises items reported by the
//! other side.
//!
//! ## Design Notes
//!
//! - The whole [`Association`] is passed so an adapter can resolve both
//!   roots: it reads the source item from the opposite root and writes the
//!   counterpart under its own root.
//! - `create_item` and `update_item` return the counterpart as this side now
//!   reports it (origin = `self.origin()`), without catalog identity.

use crate::domain::{Association, Item, Origin};

/// Port trait for one side of an association
#[async_trait::async_trait]
pub trait IItemAdapter: Send + Sync {
    /// The side this adapter serves
    fn origin(&self) -> Origin;

    /// Snapshot of every item currently present under the association's
    /// root on this side
    async fn list_items(&self, association: &Association) -> anyhow::Result<Vec<Item>>;

    /// Creates the counterpart of `source` (an item of the opposite origin)
    async fn create_item(&self, association: &Association, source: &Item)
        -> anyhow::Result<Item>;

    /// Overwrites the counterpart of `source` with its current content
    async fn update_item(&self, association: &Association, source: &Item)
        -> anyhow::Result<Item>;
}
