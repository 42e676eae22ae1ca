//! Storage traits and error types
//!
//! This module defines the trait interface for result stores and
//! associated error types.

use crate::storage::Record;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{path} has no '{column}' column")]
    MissingIdentifierColumn { path: String, column: String },

    #[error("Record has no value for identifier field '{0}'")]
    MissingIdentifier(String),

    #[error("Field '{field}' is not a column of {path}")]
    UnknownField { field: String, path: String },

    #[error("Identifier already recorded: {0}")]
    DuplicateIdentifier(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only table of records keyed by a unique identifier field
///
/// The collection driver is the single owner of a store; implementations
/// need no internal locking.
pub trait ResultStore {
    /// Name of the field holding each record's identifier
    fn identifier_field(&self) -> &str;

    /// Returns true if a record with this identifier has been recorded
    fn contains(&self, identifier: &str) -> bool;

    /// Durably appends one record
    ///
    /// On return the record survives a crash, and `contains` reports its
    /// identifier.
    fn append(&mut self, record: Record) -> StoreResult<()>;

    /// Number of records in the store
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
