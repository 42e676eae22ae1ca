use crate::config::types::Config;
use crate::config::validation::validate;
use crate::{ConfigError, HarvestError};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use coastal_sites::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Places configured: {}", config.places.is_some());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two runs writing the same CSV can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Reads the Places API key from a local file
///
/// Surrounding whitespace (a trailing newline in particular) is not part of
/// the key.
pub fn read_api_key(path: &Path) -> Result<String, HarvestError> {
    let raw = std::fs::read_to_string(path).map_err(|source| HarvestError::ApiKey {
        path: path.display().to_string(),
        source,
    })?;

    let key = raw.trim();
    if key.is_empty() {
        return Err(HarvestError::Config(ConfigError::Validation(format!(
            "API key file {} is empty",
            path.display()
        ))));
    }

    Ok(key.to_string())
}
