//! Line-delimited secondary index
//!
//! Runs the configured indexers over the artifacts of a freshly processed
//! output directory and appends their records to `<base>/index.jsonl`.

use crate::output::traits::{IndexSource, Indexer};
use crate::storage::{artifact_name, read_json};
use crate::Result;
use scraper::Html;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// File name of the shared secondary index
pub const JSONL_FILE: &str = "index.jsonl";

/// An indexer bound to the component whose pages it receives
#[derive(Clone)]
pub struct IndexerBinding {
    pub component: String,
    pub indexer: Arc<dyn Indexer>,
}

impl std::fmt::Debug for IndexerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexerBinding")
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

pub fn jsonl_path(base_dir: &Path) -> PathBuf {
    base_dir.join(JSONL_FILE)
}

/// Runs every binding over the artifacts in `output_dir`
///
/// Pages are read as `<component>-1.json`, `<component>-2.json`, ... until
/// the first missing number. A malformed artifact ends that component's run.
///
/// # Returns
///
/// * `Ok(n)` - Number of records appended
/// * `Err(SyncError)` - Writing `index.jsonl` failed
pub async fn run_indexers(
    bindings: &[IndexerBinding],
    output_dir: &Path,
    base_dir: &Path,
) -> Result<usize> {
    let mut lines = String::new();
    let mut count = 0;

    for binding in bindings {
        let mut number = 1;
        loop {
            let file_name = artifact_name(&binding.component, number);
            let path = output_dir.join(&file_name);

            let page: Value = match read_json(&path).await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Stopping indexer for {}: {}", binding.component, e);
                    break;
                }
            };

            let source = IndexSource {
                page: &page,
                output_dir,
                base_dir,
                file_name: &file_name,
            };
            for record in index_page(binding.indexer.as_ref(), &source) {
                lines.push_str(&serde_json::to_string(&record)?);
                lines.push('\n');
                count += 1;
            }

            number += 1;
        }
    }

    if count > 0 {
        append(&jsonl_path(base_dir), lines.as_bytes()).await?;
        tracing::debug!("Appended {} index records from {}", count, output_dir.display());
    }
    Ok(count)
}

/// Parses the page content and hands it to the indexer
///
/// Kept synchronous: the parsed tree must not live across an await point.
fn index_page(indexer: &dyn Indexer, source: &IndexSource<'_>) -> Vec<Value> {
    let content = source
        .page
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let fragment = Html::parse_fragment(content);
    indexer.index(&fragment, source)
}

async fn append(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await
}
