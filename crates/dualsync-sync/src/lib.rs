//! dualsync Sync - Two-sided reconciliation engine
//!
//! Provides:
//! - Catalog upsert with monotonic change versions
//! - Versioned links between counterparts
//! - Insert / Update / no-op decisions dispatched to the opposite side
//! - A wall-clock budget for scheduler-driven runs
//!
//! ## Modules
//!
//! - [`engine`] - Reconciliation driver orchestrating one run
//! - [`catalog`] - Item catalog upsert
//! - [`links`] - Per-association link resolver
//! - [`budget`] - Time budget governor
//! - [`summary`] - Transfer counters and run summary
//! - [`filesystem`] - Directory-tree item adapter (atomic copies)

pub mod budget;
pub mod catalog;
pub mod engine;
pub mod filesystem;
pub mod links;
pub mod summary;

use std::path::PathBuf;

use dualsync_core::domain::{DomainError, Origin};
use thiserror::Error;

/// Errors raised by the engine and the directory adapter
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// An external identity would resolve outside the association root
    #[error("External identity escapes the association root: {0}")]
    OutsideRoot(String),

    /// An item or adapter reported the wrong side of the association
    #[error("Origin mismatch: expected {expected}, got {actual}")]
    OriginMismatch { expected: Origin, actual: Origin },

    /// A domain-level error propagated from dualsync-core
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
}
