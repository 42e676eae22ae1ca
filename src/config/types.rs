use serde::Deserialize;

/// Meters per statute mile
pub const METERS_PER_MILE: f64 = 1_609.344;

/// Default Places API host
pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com";

/// Default tourism site host
pub const DEFAULT_TOURISM_BASE_URL: &str = "https://www.to-hawaii.com";

/// Converts a distance in miles to meters
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Main configuration structure for Coastal-Sites
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    pub places: Option<PlacesConfig>,
    pub tourism: Option<TourismConfig>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the collector
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the collector
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the project
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for collector-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Collection loop behavior shared by every source
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Upper bound on a single HTTP request, in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Pause between two item fetches (milliseconds)
    #[serde(rename = "item-delay-ms", default)]
    pub item_delay_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            item_delay_ms: 0,
        }
    }
}

/// Places API (Nearby Search) source
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesConfig {
    /// CSV file the places are appended to
    #[serde(rename = "output-path")]
    pub output_path: String,

    /// File holding the API key
    #[serde(rename = "api-key-path")]
    pub api_key_path: String,

    #[serde(rename = "base-url", default = "default_places_base_url")]
    pub base_url: String,

    /// Keywords searched around every island
    #[serde(rename = "search-terms")]
    pub search_terms: Vec<String>,

    /// Wait before requesting a continuation page (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay")]
    pub page_delay_ms: u64,

    /// Maximum result pages per search term
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Place types that disqualify a result (e.g. "restaurant", "lodging")
    #[serde(rename = "exclude-types", default)]
    pub exclude_types: Vec<String>,

    #[serde(rename = "island", default)]
    pub islands: Vec<PlacesIsland>,
}

/// Search circle for one island
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesIsland {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "radius-miles")]
    pub radius_miles: f64,
}

impl PlacesIsland {
    /// Search radius in meters, as the API expects it
    pub fn radius_meters(&self) -> f64 {
        miles_to_meters(self.radius_miles)
    }
}

/// Tourism website source
#[derive(Debug, Clone, Deserialize)]
pub struct TourismConfig {
    /// CSV file the sites are appended to
    #[serde(rename = "output-path")]
    pub output_path: String,

    #[serde(rename = "base-url", default = "default_tourism_base_url")]
    pub base_url: String,

    #[serde(rename = "island", default)]
    pub islands: Vec<TourismIsland>,
}

/// One island listing on the tourism site
#[derive(Debug, Clone, Deserialize)]
pub struct TourismIsland {
    /// Path segment of the island listing (e.g. "big-island")
    pub slug: String,

    /// Name written to the island column; derived from the slug when absent
    pub name: Option<String>,
}

impl TourismIsland {
    /// Returns the island name recorded for this listing
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }

        if self.slug == "big-island" {
            return "Hawaii".to_string();
        }

        let mut chars = self.slug.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_page_delay() -> u64 {
    2_000
}

fn default_max_pages() -> u32 {
    3
}

fn default_places_base_url() -> String {
    DEFAULT_PLACES_BASE_URL.to_string()
}

fn default_tourism_base_url() -> String {
    DEFAULT_TOURISM_BASE_URL.to_string()
}
