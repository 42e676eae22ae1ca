//! HTTP fetcher implementation
//!
//! This module handles the HTTP plumbing shared by every source, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for pages and JSON payloads
//! - Error classification into `FetchError`

use crate::config::UserAgentConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Reasons a single item (or a group listing) could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Places API returned {status}: {message}")]
    Api { status: String, message: String },

    #[error("No element matching `{selector}` on {url}")]
    MissingElement { url: String, selector: String },

    #[error("Missing field `{0}` in API response")]
    MissingField(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown group: {0}")]
    UnknownGroup(String),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout_secs` - Upper bound on a whole request
///
/// # Example
///
/// ```no_run
/// use coastal_sites::config::UserAgentConfig;
/// use coastal_sites::collect::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "CoastalSites".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, 30).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a reqwest failure onto a `FetchError`
///
/// The request URL is stripped from the underlying error; callers pass a
/// URL that is safe to log (no API key).
fn request_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error.without_url(),
        }
    }
}

/// Fetches an HTML page and returns its body
///
/// Any non-success status is an error; redirects are followed by the client.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| request_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| request_error(url, e))
}

/// Sends a GET with query parameters and decodes the JSON body
///
/// `url` must not contain secrets; secrets travel in `params` only and are
/// never part of an error.
pub async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    params: &[(&str, &str)],
) -> Result<T, FetchError> {
    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| request_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.json::<T>().await.map_err(|e| request_error(url, e))
}
