use crate::config::types::{
    CollectorConfig, Config, PlacesConfig, PlacesIsland, TourismConfig, UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_user_agent_config(&config.user_agent)?;
    validate_collector_config(&config.collector)?;

    if config.places.is_none() && config.tourism.is_none() {
        return Err(ConfigError::Validation(
            "at least one of [places] or [tourism] must be configured".to_string(),
        ));
    }

    if let Some(places) = &config.places {
        validate_places_config(places)?;
    }

    if let Some(tourism) = &config.tourism {
        validate_tourism_config(tourism)?;
    }

    if let (Some(places), Some(tourism)) = (&config.places, &config.tourism) {
        if places.output_path == tourism.output_path {
            return Err(ConfigError::Validation(format!(
                "places and tourism cannot share the output file '{}'",
                places.output_path
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the Places API source
fn validate_places_config(config: &PlacesConfig) -> Result<(), ConfigError> {
    validate_path("places output_path", &config.output_path)?;
    validate_path("places api_key_path", &config.api_key_path)?;
    validate_base_url(&config.base_url)?;

    if config.search_terms.is_empty() {
        return Err(ConfigError::Validation(
            "places search_terms cannot be empty".to_string(),
        ));
    }

    if let Some(term) = config.search_terms.iter().find(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "places search term '{}' is blank",
            term
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "places max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.islands.is_empty() {
        return Err(ConfigError::Validation(
            "places must list at least one [[places.island]]".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for island in &config.islands {
        validate_places_island(island)?;
        if !names.insert(island.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "places island '{}' is listed twice",
                island.name
            )));
        }
    }

    Ok(())
}

fn validate_places_island(island: &PlacesIsland) -> Result<(), ConfigError> {
    if island.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "places island name cannot be empty".to_string(),
        ));
    }

    if !(-90.0..=90.0).contains(&island.latitude) {
        return Err(ConfigError::Validation(format!(
            "latitude of '{}' must be within [-90, 90], got {}",
            island.name, island.latitude
        )));
    }

    if !(-180.0..=180.0).contains(&island.longitude) {
        return Err(ConfigError::Validation(format!(
            "longitude of '{}' must be within [-180, 180], got {}",
            island.name, island.longitude
        )));
    }

    if !(island.radius_miles > 0.0) {
        return Err(ConfigError::Validation(format!(
            "radius_miles of '{}' must be positive, got {}",
            island.name, island.radius_miles
        )));
    }

    Ok(())
}

/// Validates the tourism website source
fn validate_tourism_config(config: &TourismConfig) -> Result<(), ConfigError> {
    validate_path("tourism output_path", &config.output_path)?;
    validate_base_url(&config.base_url)?;

    if config.islands.is_empty() {
        return Err(ConfigError::Validation(
            "tourism must list at least one [[tourism.island]]".to_string(),
        ));
    }

    let mut slugs = HashSet::new();
    let mut names = HashSet::new();
    for island in &config.islands {
        if island.slug.is_empty()
            || !island
                .slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "tourism island slug '{}' must be non-empty and contain only letters, digits and hyphens",
                island.slug
            )));
        }

        if !slugs.insert(island.slug.as_str()) {
            return Err(ConfigError::Validation(format!(
                "tourism island '{}' is listed twice",
                island.slug
            )));
        }

        // Groups are keyed by display name
        let name = island.display_name();
        if !names.insert(name.clone()) {
            return Err(ConfigError::Validation(format!(
                "tourism island '{}' has the display name '{}' of another island",
                island.slug, name
            )));
        }
    }

    Ok(())
}

fn validate_path(what: &str, path: &str) -> Result<(), ConfigError> {
    if path.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", what)));
    }
    Ok(())
}

fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            base_url
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
