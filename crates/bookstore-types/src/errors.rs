//! # Error Types
//!
//! Errors reported by the storage collaborator.

use thiserror::Error;

/// Errors that can occur in the book storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No row matched the query (or no row was affected by a write).
    #[error("record not found: {0}")]
    NotFound(String),

    /// The database operation itself failed.
    #[error("database operation failed: {0}")]
    DatabaseError(String),
}

impl StorageError {
    /// Returns true if the error means "nothing matched".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}
