//! Google Maps Places API source
//!
//! Nearby Search is queried once per island and search term. Results come
//! in pages of up to 20; a `next_page_token` continues the query, but the
//! token only becomes valid a short while after it is issued, so every
//! continuation waits first and retries a few times on `INVALID_REQUEST`.

use crate::collect::fetcher::fetch_json;
use crate::collect::source::{ItemFetcher, WorkItem, WorkSource};
use crate::collect::FetchError;
use crate::config::{PlacesConfig, PlacesIsland};
use crate::storage::Record;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// Column holding the place ID
pub const PLACE_ID_FIELD: &str = "place_id";

/// Prefix of the canonical Google Maps link of a place
pub const PLACE_URL_PREFIX: &str = "https://www.google.com/maps/place/?q=place_id:";

const NEARBY_SEARCH_PATH: &str = "/maps/api/place/nearbysearch/json";
const DETAILS_PATH: &str = "/maps/api/place/details/json";
const DETAILS_FIELDS: &str = "name,vicinity,types,user_ratings_total,rating,place_id,geometry";

/// Attempts allowed for a continuation token that is not valid yet
const CONTINUATION_RETRIES: u32 = 3;

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    #[serde(default)]
    results: Vec<Value>,
    next_page_token: Option<String>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: Option<Value>,
    status: String,
    error_message: Option<String>,
}

fn check_status(status: &str, message: Option<String>) -> Result<(), FetchError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        _ => Err(FetchError::Api {
            status: status.to_string(),
            message: message.unwrap_or_default(),
        }),
    }
}

/// Thin client over the Places web service
#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_delay: Duration,
    max_pages: u32,
}

impl PlacesClient {
    pub fn new(client: Client, config: &PlacesConfig, api_key: String) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            page_delay: Duration::from_millis(config.page_delay_ms),
            max_pages: config.max_pages,
        }
    }

    /// Runs one Nearby Search, following continuation pages
    ///
    /// # Arguments
    ///
    /// * `island` - Search circle
    /// * `keyword` - Search term
    ///
    /// # Returns
    ///
    /// All results of every page, in page order. Only the first page is
    /// required; a failing continuation ends the query with what it has.
    pub async fn nearby_search(
        &self,
        island: &PlacesIsland,
        keyword: &str,
    ) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}{}", self.base_url, NEARBY_SEARCH_PATH);
        let location = format!("{},{}", island.latitude, island.longitude);
        let radius = format!("{}", island.radius_meters());

        let mut response: NearbyResponse = fetch_json(
            &self.client,
            &url,
            &[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("keyword", keyword),
                ("key", self.api_key.as_str()),
            ],
        )
        .await?;
        check_status(&response.status, response.error_message.take())?;

        let mut results = std::mem::take(&mut response.results);
        let mut pages = 1;

        while let Some(token) = response.next_page_token.take() {
            if pages >= self.max_pages {
                tracing::debug!(
                    "Stopping {} / {} after {} pages",
                    island.name,
                    keyword,
                    pages
                );
                break;
            }

            response = match self.continuation(&url, &token).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(
                        "Page {} failed for {} / {}, keeping {} results: {}",
                        pages + 1,
                        island.name,
                        keyword,
                        results.len(),
                        e
                    );
                    break;
                }
            };
            results.append(&mut response.results);
            pages += 1;
        }

        Ok(results)
    }

    async fn continuation(&self, url: &str, token: &str) -> Result<NearbyResponse, FetchError> {
        let mut attempts = 0;
        loop {
            tokio::time::sleep(self.page_delay).await;

            let mut response: NearbyResponse = fetch_json(
                &self.client,
                url,
                &[("pagetoken", token), ("key", self.api_key.as_str())],
            )
            .await?;

            if response.status == "INVALID_REQUEST" && attempts < CONTINUATION_RETRIES {
                attempts += 1;
                tracing::debug!("Page token not ready yet (attempt {})", attempts);
                continue;
            }

            check_status(&response.status, response.error_message.take())?;
            return Ok(response);
        }
    }

    /// Looks up a single place by ID
    pub async fn place_details(&self, place_id: &str) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, DETAILS_PATH);
        let response: DetailsResponse = fetch_json(
            &self.client,
            &url,
            &[
                ("place_id", place_id),
                ("fields", DETAILS_FIELDS),
                ("key", self.api_key.as_str()),
            ],
        )
        .await?;

        check_status(&response.status, response.error_message)?;
        response
            .result
            .ok_or_else(|| FetchError::MissingField("result".to_string()))
    }
}

/// Enumerates places around each island for every search term
pub struct PlacesSource {
    client: PlacesClient,
    islands: Vec<PlacesIsland>,
    search_terms: Vec<String>,
    exclude_types: HashSet<String>,
}

impl PlacesSource {
    pub fn new(client: PlacesClient, config: &PlacesConfig) -> Self {
        Self {
            client,
            islands: config.islands.clone(),
            search_terms: config.search_terms.clone(),
            exclude_types: config.exclude_types.iter().cloned().collect(),
        }
    }

    fn is_excluded(&self, place: &Value) -> bool {
        place["types"]
            .as_array()
            .map(|types| {
                types
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|t| self.exclude_types.contains(t))
            })
            .unwrap_or(false)
    }
}

#[async_trait]
impl WorkSource for PlacesSource {
    fn groups(&self) -> Vec<String> {
        self.islands.iter().map(|island| island.name.clone()).collect()
    }

    /// Searches every term around the island
    ///
    /// A failing term is logged and the remaining terms still run; the group
    /// fails only when every term failed.
    async fn enumerate(&self, group: &str) -> Result<Vec<WorkItem>, FetchError> {
        let island = self
            .islands
            .iter()
            .find(|island| island.name == group)
            .ok_or_else(|| FetchError::UnknownGroup(group.to_string()))?;

        let mut items = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0;

        for term in &self.search_terms {
            let results = match self.client.nearby_search(island, term).await {
                Ok(results) => results,
                Err(e) => {
                    tracing::error!("Search failed in {} for search term {}: {}", group, term, e);
                    last_error = Some(e);
                    continue;
                }
            };
            succeeded += 1;

            let found = results.len();
            for place in results {
                let Some(place_id) = place["place_id"].as_str().map(str::to_string) else {
                    tracing::warn!("Skipping result without place_id in {} / {}", group, term);
                    continue;
                };

                if self.is_excluded(&place) {
                    tracing::debug!("Skipping {} (excluded type)", place_id);
                    continue;
                }

                items.push(
                    WorkItem::new(place_id, group)
                        .with_classification(term.as_str())
                        .with_listing(place),
                );
            }

            tracing::info!(
                "Search complete for {} for search term: {} ({} results)",
                group,
                term,
                found
            );
        }

        match last_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => Ok(items),
        }
    }
}

/// Turns a place into a record, calling Place Details when no listing is at hand
pub struct PlacesFetcher {
    client: PlacesClient,
}

impl PlacesFetcher {
    pub fn new(client: PlacesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ItemFetcher for PlacesFetcher {
    async fn fetch(&self, item: &WorkItem) -> Result<Record, FetchError> {
        match &item.listing {
            Some(place) => place_record(place),
            None => {
                let place = self.client.place_details(&item.identifier).await?;
                place_record(&place)
            }
        }
    }
}

/// Builds the record of one place
///
/// Columns: name, vicinity, types, user_ratings_total, rating, place_id,
/// url, lat, lon. `place_id` and the coordinates are required.
pub fn place_record(place: &Value) -> Result<Record, FetchError> {
    let place_id = place["place_id"]
        .as_str()
        .ok_or_else(|| FetchError::MissingField("place_id".to_string()))?;

    let location = &place["geometry"]["location"];
    let lat = location["lat"]
        .as_f64()
        .ok_or_else(|| FetchError::MissingField("geometry.location.lat".to_string()))?;
    let lon = location["lng"]
        .as_f64()
        .ok_or_else(|| FetchError::MissingField("geometry.location.lng".to_string()))?;

    let types = place["types"].as_array().map(|types| {
        types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    });

    Ok(Record::new()
        .with("name", place["name"].as_str())
        .with("vicinity", place["vicinity"].as_str())
        .with("types", types)
        .with("user_ratings_total", place["user_ratings_total"].as_i64())
        .with("rating", place["rating"].as_f64())
        .with(PLACE_ID_FIELD, place_id)
        .with("url", format!("{}{}", PLACE_URL_PREFIX, place_id))
        .with("lat", lat)
        .with("lon", lon))
}
