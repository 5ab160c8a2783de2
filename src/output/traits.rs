//! Secondary indexer trait and associated types

use scraper::Html;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Where an indexed page came from
#[derive(Debug, Clone, Copy)]
pub struct IndexSource<'a> {
    /// The page artifact as stored on disk
    pub page: &'a Value,

    /// Directory holding the artifact
    pub output_dir: &'a Path,

    /// Base directory of the site (where `index.jsonl` lives)
    pub base_dir: &'a Path,

    /// Artifact file name, e.g. `v1-3.json`
    pub file_name: &'a str,
}

impl IndexSource<'_> {
    /// Artifact path relative to the site base, with `/` separators
    ///
    /// Falls back to the absolute path when the output directory is not
    /// below the base directory.
    pub fn relative_file(&self) -> String {
        let full: PathBuf = self.output_dir.join(self.file_name);
        let relative = full.strip_prefix(self.base_dir).unwrap_or(&full);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Trait for secondary indexers
///
/// An indexer is handed every page of one component, in page order, and
/// returns the records to append to the shared `index.jsonl`. Implementations
/// must be thread-safe since page transforms run concurrently.
pub trait Indexer: Send + Sync {
    /// Produces zero or more records for one page
    ///
    /// # Arguments
    ///
    /// * `fragment` - The page's `content` parsed as an HTML fragment
    /// * `source` - The raw artifact and where it lives
    fn index(&self, fragment: &Html, source: &IndexSource<'_>) -> Vec<Value>;
}
