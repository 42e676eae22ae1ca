//! Configuration module for Coastal-Sites
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use coastal_sites::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Request timeout: {}s", config.collector.request_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    miles_to_meters, CollectorConfig, Config, PlacesConfig, PlacesIsland, TourismConfig,
    TourismIsland, UserAgentConfig, DEFAULT_PLACES_BASE_URL, DEFAULT_TOURISM_BASE_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, read_api_key};
