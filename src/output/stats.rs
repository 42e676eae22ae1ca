//! Statistics generation from a result store
//!
//! This module provides functionality for summarizing and displaying the
//! contents of a collected CSV file.

use crate::collect::{CLASSIFICATION_FIELD, ISLAND_FIELD};
use crate::storage::{CsvStore, ResultStore};
use std::collections::BTreeMap;

/// Label used for records without a value in a counted column
const UNSET: &str = "(none)";

/// Summary of one result store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStatistics {
    /// Path of the CSV file
    pub path: String,

    /// Number of records in the file
    pub total_records: usize,

    /// Number of distinct identifiers
    pub unique_identifiers: usize,

    /// Records per island
    pub by_island: BTreeMap<String, usize>,

    /// Records per search term; empty when the file has no such column
    pub by_classification: BTreeMap<String, usize>,
}

/// Computes statistics over every record of a store
pub fn load_statistics(store: &CsvStore) -> StoreStatistics {
    let has_column = |column: &str| {
        store
            .header()
            .map(|header| header.iter().any(|h| h == column))
            .unwrap_or(false)
    };

    let mut by_island = BTreeMap::new();
    let mut by_classification = BTreeMap::new();
    let mut identifiers = std::collections::HashSet::new();
    let count_classification = has_column(CLASSIFICATION_FIELD);

    for record in store.records() {
        let island = record.text(ISLAND_FIELD).unwrap_or_else(|| UNSET.to_string());
        *by_island.entry(island).or_insert(0) += 1;

        if count_classification {
            let term = record
                .text(CLASSIFICATION_FIELD)
                .unwrap_or_else(|| UNSET.to_string());
            *by_classification.entry(term).or_insert(0) += 1;
        }

        if let Some(id) = record.text(store.identifier_field()) {
            identifiers.insert(id);
        }
    }

    StoreStatistics {
        path: store.path().display().to_string(),
        total_records: store.len(),
        unique_identifiers: identifiers.len(),
        by_island,
        by_classification,
    }
}

/// Prints statistics to stdout in a human-readable format
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== {} ===", stats.path);
    println!("  Records: {}", stats.total_records);
    println!("  Unique identifiers: {}", stats.unique_identifiers);

    if stats.unique_identifiers < stats.total_records {
        println!(
            "  Warning: {} rows repeat an identifier",
            stats.total_records - stats.unique_identifiers
        );
    }

    println!("\n  By island:");
    for (island, count) in &stats.by_island {
        println!("    {:<20} {}", island, count);
    }

    if !stats.by_classification.is_empty() {
        println!("\n  By search term:");
        for (term, count) in &stats.by_classification {
            println!("    {:<20} {}", term, count);
        }
    }
    println!();
}
