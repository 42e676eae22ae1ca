//! Collection module for gathering site records
//!
//! This module contains the core collection logic, including:
//! - Work source and item fetcher contracts
//! - HTTP fetching and error classification
//! - The Places API and tourism website sources
//! - The resumable collection driver

mod driver;
mod fetcher;
pub mod places;
mod source;
pub mod tourism;

pub use driver::{
    CollectionDriver, CollectionReport, FailedItem, CLASSIFICATION_FIELD, ISLAND_FIELD,
};
pub use fetcher::{build_http_client, fetch_json, fetch_page, FetchError};
pub use places::{PlacesClient, PlacesFetcher, PlacesSource};
pub use source::{ItemFetcher, WorkItem, WorkSource};
pub use tourism::{TourismFetcher, TourismSource};

use crate::config::{read_api_key, Config, PlacesConfig, TourismConfig};
use crate::storage::CsvStore;
use crate::{ConfigError, HarvestError};
use clap::ValueEnum;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// The external sources sites are collected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Google Maps Places API nearby search
    Places,
    /// Tourism website beach listings
    Tourism,
}

impl SourceKind {
    /// Column that identifies a record of this source
    pub fn identifier_field(&self) -> &'static str {
        match self {
            Self::Places => places::PLACE_ID_FIELD,
            Self::Tourism => tourism::SITE_LINK_FIELD,
        }
    }

    /// Output file configured for this source, if the source is configured
    pub fn output_path<'a>(&self, config: &'a Config) -> Option<&'a str> {
        match self {
            Self::Places => config.places.as_ref().map(|p| p.output_path.as_str()),
            Self::Tourism => config.tourism.as_ref().map(|t| t.output_path.as_str()),
        }
    }

    /// Sources with a section in the configuration, in run order
    pub fn configured(config: &Config) -> Vec<SourceKind> {
        [Self::Places, Self::Tourism]
            .into_iter()
            .filter(|kind| kind.output_path(config).is_some())
            .collect()
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Places => f.write_str("places"),
            Self::Tourism => f.write_str("tourism"),
        }
    }
}

/// Runs one collection pass for a source
///
/// # Arguments
///
/// * `config` - The full configuration
/// * `kind` - Which source to collect from
///
/// # Returns
///
/// * `Ok(CollectionReport)` - The pass finished; individual items may have failed
/// * `Err(HarvestError)` - The source is not configured or the store failed
pub async fn collect(config: &Config, kind: SourceKind) -> Result<CollectionReport, HarvestError> {
    match kind {
        SourceKind::Places => {
            let places = config.places.as_ref().ok_or_else(|| not_configured(kind))?;
            collect_places(config, places).await
        }
        SourceKind::Tourism => {
            let tourism = config.tourism.as_ref().ok_or_else(|| not_configured(kind))?;
            collect_tourism(config, tourism).await
        }
    }
}

fn not_configured(kind: SourceKind) -> HarvestError {
    HarvestError::Config(ConfigError::Validation(format!(
        "source '{}' has no section in the configuration",
        kind
    )))
}

async fn collect_places(
    config: &Config,
    places: &PlacesConfig,
) -> Result<CollectionReport, HarvestError> {
    let api_key = read_api_key(Path::new(&places.api_key_path))?;
    let store = CsvStore::open(
        Path::new(&places.output_path),
        SourceKind::Places.identifier_field(),
    )?;
    tracing::info!(
        "Collecting places into {} ({} already recorded)",
        places.output_path,
        store.records().len()
    );

    let http = build_http_client(&config.user_agent, config.collector.request_timeout_secs)?;
    let client = PlacesClient::new(http, places, api_key);
    let source = PlacesSource::new(client.clone(), places);
    let fetcher = PlacesFetcher::new(client);

    let mut driver = CollectionDriver::new(source, fetcher, store)
        .with_item_delay(Duration::from_millis(config.collector.item_delay_ms));
    Ok(driver.run().await?)
}

async fn collect_tourism(
    config: &Config,
    tourism: &TourismConfig,
) -> Result<CollectionReport, HarvestError> {
    let store = CsvStore::open(
        Path::new(&tourism.output_path),
        SourceKind::Tourism.identifier_field(),
    )?;
    tracing::info!(
        "Collecting tourism sites into {} ({} already recorded)",
        tourism.output_path,
        store.records().len()
    );

    let http = build_http_client(&config.user_agent, config.collector.request_timeout_secs)?;
    let source = TourismSource::new(http.clone(), tourism);
    let fetcher = TourismFetcher::new(http);

    let mut driver = CollectionDriver::new(source, fetcher, store)
        .with_item_delay(Duration::from_millis(config.collector.item_delay_ms));
    Ok(driver.run().await?)
}
