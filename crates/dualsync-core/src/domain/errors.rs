//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures and missing catalog identities.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// External identity is empty or malformed
    #[error("Invalid external identity: {0}")]
    InvalidExternalId(String),

    /// Association root is empty or not absolute
    #[error("Invalid root location: {0}")]
    InvalidRoot(String),

    /// The item has not been through the catalog yet
    #[error("Item has no catalog identity: {0}")]
    Untracked(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidExternalId(String::new());
        assert_eq!(err.to_string(), "Invalid external identity: ");

        let err = DomainError::Untracked("docs/a.txt".to_string());
        assert_eq!(err.to_string(), "Item has no catalog identity: docs/a.txt");

        let err = DomainError::InvalidRoot("relative/path".to_string());
        assert_eq!(err.to_string(), "Invalid root location: relative/path");
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::InvalidId("x".to_string());
        let err2 = DomainError::InvalidId("x".to_string());
        let err3 = DomainError::InvalidId("y".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
