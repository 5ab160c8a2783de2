use crate::config::types::{Config, IndexerEntry, RemoteConfig, SyncConfig};
use crate::ConfigError;
use scraper::Selector;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_remote_config(&config.remote)?;
    validate_sync_config(&config.sync)?;
    validate_indexers(&config.indexers)?;
    Ok(())
}

/// Validates the remote endpoint configuration
fn validate_remote_config(config: &RemoteConfig) -> Result<(), ConfigError> {
    let url = config.base_url()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "remote url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "remote url '{}' has no host",
            config.url
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates synchronization settings
fn validate_sync_config(config: &SyncConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.limit == Some(0) {
        return Err(ConfigError::Validation(
            "limit must be >= 1 when set".to_string(),
        ));
    }

    if config.collection_page_size < 1 {
        return Err(ConfigError::Validation(
            "collection-page-size must be >= 1".to_string(),
        ));
    }

    if config.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.use_cache && config.cache_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cache-dir cannot be empty while the cache is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates secondary indexer entries
fn validate_indexers(indexers: &[IndexerEntry]) -> Result<(), ConfigError> {
    for entry in indexers {
        if entry.component.trim().is_empty() {
            return Err(ConfigError::Validation(
                "indexer component cannot be empty".to_string(),
            ));
        }

        if let Some(exclude) = &entry.exclude {
            Selector::parse(exclude).map_err(|e| {
                ConfigError::Validation(format!(
                    "Invalid exclude selector '{}' for component '{}': {:?}",
                    exclude, entry.component, e
                ))
            })?;
        }
    }

    Ok(())
}
