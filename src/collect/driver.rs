//! Collection driver - the resumable collection loop
//!
//! The driver walks every group of a work source, skips items the store
//! already holds, fetches the rest one at a time and appends each record
//! before moving on. The store is the only state carried between runs, so a
//! run can be stopped at any point and started again.

use crate::collect::source::{ItemFetcher, WorkItem, WorkSource};
use crate::storage::{ResultStore, StoreError};
use std::time::Duration;

/// Column holding the group (island) of a record
pub const ISLAND_FIELD: &str = "island";

/// Column holding the search term that produced a record
pub const CLASSIFICATION_FIELD: &str = "classification";

/// An item or group whose fetch failed during a run
#[derive(Debug, Clone, PartialEq)]
pub struct FailedItem {
    /// Item identifier, or the group key for a failed enumeration
    pub identifier: String,
    pub group: String,
    pub error: String,
}

/// Outcome of one driver run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionReport {
    /// Groups whose enumeration succeeded
    pub groups: usize,
    /// Items yielded by the work source
    pub enumerated: usize,
    /// Items skipped because the store already held them
    pub skipped: usize,
    /// Records appended in this run
    pub appended: usize,
    /// Items whose fetch failed
    pub failed: Vec<FailedItem>,
    /// Groups whose enumeration failed
    pub failed_groups: Vec<FailedItem>,
    /// Records in the store once the run finished
    pub total_records: usize,
}

/// Resumable collection loop over one source, fetcher and store
pub struct CollectionDriver<W, F, S> {
    source: W,
    fetcher: F,
    store: S,
    item_delay: Duration,
}

impl<W, F, S> CollectionDriver<W, F, S>
where
    W: WorkSource,
    F: ItemFetcher,
    S: ResultStore,
{
    pub fn new(source: W, fetcher: F, store: S) -> Self {
        Self {
            source,
            fetcher,
            store,
            item_delay: Duration::ZERO,
        }
    }

    /// Sets the pause inserted between two consecutive fetches
    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs one pass over every group
    ///
    /// Fetch failures are logged and recorded in the report; they never stop
    /// the run. A store failure does: the run returns the error as soon as an
    /// append fails, leaving every earlier record on disk.
    pub async fn run(&mut self) -> Result<CollectionReport, StoreError> {
        let mut report = CollectionReport::default();
        let mut fetched_any = false;

        for group in self.source.groups() {
            let items = match self.source.enumerate(&group).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::error!("Error listing {}: {}", group, e);
                    report.failed_groups.push(FailedItem {
                        identifier: group.clone(),
                        group: group.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            report.groups += 1;
            report.enumerated += items.len();

            let pending = items
                .iter()
                .filter(|item| !self.store.contains(&item.identifier))
                .count();
            tracing::info!(
                "{}: {} items, {} not yet collected",
                group,
                items.len(),
                pending
            );

            for item in items {
                if self.store.contains(&item.identifier) {
                    tracing::debug!("Skipping {} (already collected)", item.identifier);
                    report.skipped += 1;
                    continue;
                }

                if fetched_any && !self.item_delay.is_zero() {
                    tokio::time::sleep(self.item_delay).await;
                }
                fetched_any = true;

                self.process_item(item, &mut report).await?;
            }
        }

        report.total_records = self.store.len();
        tracing::info!("Number of rows in file: {}", report.total_records);

        Ok(report)
    }

    /// Fetches, enriches and appends a single item
    async fn process_item(
        &mut self,
        item: WorkItem,
        report: &mut CollectionReport,
    ) -> Result<(), StoreError> {
        let mut record = match self.fetcher.fetch(&item).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Error processing {}: {}", item.identifier, e);
                report.failed.push(FailedItem {
                    identifier: item.identifier,
                    group: item.group,
                    error: e.to_string(),
                });
                return Ok(());
            }
        };

        record.set(ISLAND_FIELD, item.group.as_str());
        if let Some(classification) = &item.classification {
            record.set(CLASSIFICATION_FIELD, classification.as_str());
        }
        let identifier_field = self.store.identifier_field().to_string();
        record.set(&identifier_field, item.identifier.as_str());

        self.store.append(record)?;
        report.appended += 1;
        tracing::debug!("Collected {}", item.identifier);

        Ok(())
    }
}
