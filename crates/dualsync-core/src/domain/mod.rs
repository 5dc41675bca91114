//! Domain entities and business logic
//!
//! This module contains the core domain types for dualsync:
//! - Newtypes for type-safe identifiers and versions
//! - Associations (configured local/remote root pairs)
//! - Items (origin-tagged file and folder descriptors)
//! - Links (versioned pairings of catalog entries)
//! - Run modes (time-boxed background runs vs on-demand runs)
//! - Domain-specific error types

pub mod association;
pub mod errors;
pub mod item;
pub mod link;
pub mod newtypes;
pub mod run_mode;

// Re-export commonly used types
pub use association::Association;
pub use errors::DomainError;
pub use item::{Item, Origin};
pub use link::Link;
pub use newtypes::*;
pub use run_mode::RunMode;
