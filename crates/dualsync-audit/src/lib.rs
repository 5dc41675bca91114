//! dualsync Audit - Durable run diagnostics
//!
//! Provides:
//! - `DiagnosticsLogger`: formats run, association and item-failure events
//! - Integration with `IDiagnosticsSink` for persistent storage

pub mod logger;

pub use logger::DiagnosticsLogger;
