//! Storage module for persisting collected sites
//!
//! This module handles the durable result store, including:
//! - Record and cell value types
//! - CSV file loading, header management and appends
//! - Identifier tracking for resumable runs

mod csv_store;
mod record;
mod traits;

pub use csv_store::CsvStore;
pub use record::{FieldValue, Record};
pub use traits::{ResultStore, StoreError, StoreResult};

