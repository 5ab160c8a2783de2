//! Output module for secondary indexing and run summaries
//!
//! This module handles:
//! - The pluggable `Indexer` trait and the built-in plain text indexer
//! - Appending indexer records to the shared `index.jsonl`
//! - Summaries of what a run did

mod jsonl;
mod plain_text;
mod summary;
mod traits;

pub use jsonl::{jsonl_path, run_indexers, IndexerBinding, JSONL_FILE};
pub use plain_text::{extract_plain_text, PlainTextIndexer, DEFAULT_EXCLUDE};
pub use summary::{format_markdown_summary, SyncSummary, TransformReport};
pub use traits::{IndexSource, Indexer};

use crate::config::{IndexerEntry, IndexerKind};
use crate::ConfigError;
use std::sync::Arc;

/// Builds the indexer bindings declared in the configuration
///
/// # Returns
///
/// * `Ok(bindings)` - One binding per `[[indexer]]` entry, in order
/// * `Err(ConfigError)` - An entry could not be built
pub fn build_indexers(entries: &[IndexerEntry]) -> Result<Vec<IndexerBinding>, ConfigError> {
    entries
        .iter()
        .map(|entry| {
            let indexer: Arc<dyn Indexer> = match entry.kind {
                IndexerKind::PlainText => Arc::new(PlainTextIndexer::new(entry.exclude.as_deref())?),
            };
            Ok(IndexerBinding {
                component: entry.component.clone(),
                indexer,
            })
        })
        .collect()
}
