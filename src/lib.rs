//! Coastal-Sites: a resumable collector for Hawaii coastal recreation sites
//!
//! This crate gathers site data from the Google Maps Places API and from a
//! tourism website, appending one CSV row per site. Runs are safe to
//! interrupt: re-running skips every site already present in the output file.

pub mod collect;
pub mod config;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for Coastal-Sites operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to read API key from {path}: {source}")]
    ApiKey {
        path: String,
        source: std::io::Error,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Coastal-Sites operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use collect::{CollectionDriver, CollectionReport, WorkItem};
pub use config::Config;
pub use storage::{CsvStore, FieldValue, Record, ResultStore};
