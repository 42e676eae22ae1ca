//! Work items and the contracts of work sources and item fetchers

use crate::collect::FetchError;
use crate::storage::Record;
use async_trait::async_trait;

/// One unit of collection work: a site to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    /// Canonical identifier from the external source (place ID or page URL)
    pub identifier: String,

    /// Island the item was enumerated for
    pub group: String,

    /// Search term that produced the item, when the source searches
    pub classification: Option<String>,

    /// Listing payload already received while enumerating
    pub listing: Option<serde_json::Value>,
}

impl WorkItem {
    pub fn new(identifier: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            group: group.into(),
            classification: None,
            listing: None,
        }
    }

    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }

    pub fn with_listing(mut self, listing: serde_json::Value) -> Self {
        self.listing = Some(listing);
        self
    }
}

/// Enumerates candidate work items, one group (island) at a time
///
/// Enumeration order depends on external state and may change between runs;
/// callers use it for progress reporting only.
#[async_trait]
pub trait WorkSource: Send + Sync {
    /// Group keys, in processing order
    fn groups(&self) -> Vec<String>;

    /// Lists the work items of one group
    async fn enumerate(&self, group: &str) -> Result<Vec<WorkItem>, FetchError>;
}

/// Retrieves the structured data of one work item
///
/// Any waiting a fetcher does is bounded; an exhausted wait is a
/// `FetchError::Timeout`.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch(&self, item: &WorkItem) -> Result<Record, FetchError>;
}
