use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Main configuration structure for tei-sync
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default, rename = "indexer")]
    pub indexers: Vec<IndexerEntry>,
}

impl Config {
    /// Creates a configuration with default sync settings for the given remote
    pub fn for_remote(url: &str) -> Self {
        Self {
            remote: RemoteConfig::new(url),
            sync: SyncConfig::default(),
            indexers: Vec::new(),
        }
    }
}

/// Remote TEI Publisher endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the publisher app; all API paths resolve against it
    pub url: String,

    /// Request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How many times a timed out or 5xx request is retried
    #[serde(rename = "max-retries", default)]
    pub max_retries: u32,

    /// Delay between retries (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl RemoteConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }

    /// Returns the remote URL with a guaranteed trailing slash
    ///
    /// Relative API paths are joined onto this URL, so without the slash the
    /// last path segment of the app root would be replaced.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.url, e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Synchronization behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Base output directory of the generated site
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum number of pages retrieved per view (unlimited when absent)
    #[serde(default)]
    pub limit: Option<u32>,

    /// Number of page transforms allowed to run at once
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Whether to crawl the remote collection hierarchy
    #[serde(default)]
    pub collections: bool,

    /// Number of entries the remote returns per collection listing page
    #[serde(rename = "collection-page-size", default = "default_page_size")]
    pub collection_page_size: u32,

    /// Whether remote fetches and the document catalog go through the cache
    #[serde(rename = "use-cache", default = "default_true")]
    pub use_cache: bool,

    /// Directory holding cache entries
    #[serde(rename = "cache-dir", default = "default_cache_dir")]
    pub cache_dir: String,

    /// Turns every operation into a no-op
    #[serde(default)]
    pub disabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            limit: None,
            concurrency: default_concurrency(),
            collections: false,
            collection_page_size: default_page_size(),
            use_cache: true,
            cache_dir: default_cache_dir(),
            disabled: false,
        }
    }
}

/// A secondary indexer attached to one view component
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerEntry {
    /// Component (view id) whose pages are indexed
    pub component: String,

    /// Which built-in indexer to run
    #[serde(default)]
    pub kind: IndexerKind,

    /// CSS selector of subtrees left out of the indexed text
    #[serde(default)]
    pub exclude: Option<String>,
}

/// Built-in secondary indexers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexerKind {
    #[default]
    PlainText,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_output_dir() -> String {
    "_site".to_string()
}

fn default_concurrency() -> u32 {
    2
}

fn default_page_size() -> u32 {
    10
}

fn default_cache_dir() -> String {
    ".cache".to_string()
}

fn default_true() -> bool {
    true
}
