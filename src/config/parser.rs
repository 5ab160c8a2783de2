use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable that disables all synchronization when set to `true`
pub const DISABLED_ENV: &str = "TP_DISABLED";

/// Environment variable that bypasses the content cache when set to `true`
pub const NO_CACHE_ENV: &str = "TP_NO_CACHE";

/// Loads and parses a configuration file from the given path
///
/// Environment overrides (`TP_DISABLED`, `TP_NO_CACHE`) are applied before
/// validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    let config = apply_overrides(
        config,
        std::env::var(DISABLED_ENV).ok().as_deref(),
        std::env::var(NO_CACHE_ENV).ok().as_deref(),
    );

    validate(&config)?;

    Ok(config)
}

/// Applies the `TP_DISABLED` / `TP_NO_CACHE` overrides to a configuration
///
/// Only the literal value `true` switches a flag; anything else leaves the
/// file's setting untouched.
pub fn apply_overrides(mut config: Config, disabled: Option<&str>, no_cache: Option<&str>) -> Config {
    if disabled == Some("true") {
        config.sync.disabled = true;
    }
    if no_cache == Some("true") {
        config.sync.use_cache = false;
    }
    config
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
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
