//! tei-sync: an incremental mirror of TEI Publisher documents
//!
//! This crate synchronizes a local site tree with content served by a remote
//! TEI Publisher instance. Pages containing `<pb-view>` references are expanded
//! into paginated JSON fragments, an `index.json` maps parameter fingerprints to
//! the fragment files, and a collection crawler builds a catalog of all documents.

pub mod cache;
pub mod client;
pub mod collections;
pub mod config;
pub mod output;
pub mod page;
pub mod state;
pub mod storage;
pub mod sync;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tei-sync operations
///
/// Network failures never appear here: the remote client logs them and the
/// affected unit of work is skipped. What remains are failures that abort the
/// current page or the whole run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load metadata for {path}")]
    MissingMetadata { path: String },

    #[error("Invalid view parameters: {0}")]
    Params(#[from] ParamError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
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

/// Errors raised while assembling view request parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("Parameter '{0}' is not a recognized view parameter")]
    UnknownKey(String),

    #[error("User parameter is missing a name")]
    EmptyUserName,
}

/// Result type alias for tei-sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use collections::{Catalog, CatalogEntry};
pub use config::Config;
pub use page::ParamSet;
pub use storage::{fingerprint, PageIndex};
pub use sync::{PageContext, Publisher};
