//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IItemAdapter`] - One side (local or remote) of an association
//! - [`ICatalogStore`], [`ILinkStore`] - Catalog entries and the links between them
//! - [`IAssociationRegistry`], [`IRunStateStore`] - Configuration and run state
//! - [`IDiagnosticsSink`] - Durable diagnostics log
//! - [`INotificationService`] - User-facing notifications

pub mod diagnostics;
pub mod item_adapter;
pub mod notification;
pub mod state_repository;

pub use diagnostics::IDiagnosticsSink;
pub use item_adapter::IItemAdapter;
pub use notification::{INotificationService, Notification, NotificationPriority};
pub use state_repository::{
    CatalogEntry, IAssociationRegistry, ICatalogStore, ILinkStore, IRunStateStore,
};
