//! dualsync Core - Domain logic and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Item`, `Association`, `Link`, and the newtypes that identify them
//! - **Port definitions** - Traits for adapters: `IItemAdapter`, `ICatalogStore`, `ILinkStore`,
//!   `IAssociationRegistry`, `IRunStateStore`, `IDiagnosticsSink`, `INotificationService`
//! - **Configuration** - YAML-backed settings for the CLI
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement; the
//! reconciliation engine in `dualsync-sync` drives them.

pub mod config;
pub mod domain;
pub mod ports;
