//! Output module for reporting on collected data
//!
//! This module handles:
//! - Statistics over existing CSV files
//! - Human-readable run reports

pub mod stats;

pub use stats::{load_statistics, print_statistics, StoreStatistics};

use crate::collect::{CollectionReport, SourceKind};

/// Logs the outcome of a collection run
pub fn log_report(kind: SourceKind, report: &CollectionReport) {
    tracing::info!(
        "{}: {} groups, {} items enumerated, {} already collected, {} appended, {} failed",
        kind,
        report.groups,
        report.enumerated,
        report.skipped,
        report.appended,
        report.failed.len()
    );

    for group in &report.failed_groups {
        tracing::warn!("{}: listing of {} failed: {}", kind, group.group, group.error);
    }

    if !report.failed.is_empty() {
        tracing::warn!(
            "{}: {} items failed; run again to retry them",
            kind,
            report.failed.len()
        );
        for item in &report.failed {
            tracing::warn!("  {} ({}): {}", item.identifier, item.group, item.error);
        }
    }

    tracing::info!("{}: {} records in file", kind, report.total_records);
}
