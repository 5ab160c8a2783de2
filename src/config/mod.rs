//! Configuration module for tei-sync
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use tei_sync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tei-sync.toml")).unwrap();
//! println!("Syncing from {}", config.remote.url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, IndexerEntry, IndexerKind, RemoteConfig, SyncConfig};

// Re-export parser functions
pub use parser::{apply_overrides, compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
