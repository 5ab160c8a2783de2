//! Per-directory fingerprint index
//!
//! `index.json` maps the fingerprint of a parameter set to the artifact file
//! that answers it. Keys are kept sorted so the file is byte-stable across
//! runs with the same content.

use crate::page::ParamSet;
use crate::storage::artifact::{artifact_number, read_json, write_json_pretty};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the index inside an output directory
pub const INDEX_FILE: &str = "index.json";

/// Canonical, order-independent key for a parameter set
///
/// Keys are sorted, rendered as `key=value` and joined with `&`.
///
/// ```
/// use tei_sync::{fingerprint, ParamSet};
///
/// let a: ParamSet = [("view", "div"), ("odd", "x.odd")].into_iter().collect();
/// assert_eq!(fingerprint(&a), "odd=x.odd&view=div");
/// ```
pub fn fingerprint(params: &ParamSet) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Fingerprint → artifact file name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageIndex {
    entries: BTreeMap<String, String>,
}

impl PageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(INDEX_FILE)
    }

    /// Loads the index of an output directory
    ///
    /// A missing index is empty. A corrupt one is logged and treated as empty,
    /// since every entry it held can be rebuilt by fetching again.
    pub async fn load(dir: &Path) -> Result<Self> {
        match read_json(&Self::path_in(dir)).await {
            Ok(Some(index)) => Ok(index),
            Ok(None) => Ok(Self::new()),
            Err(crate::SyncError::Json { path, source }) => {
                tracing::warn!("Discarding malformed index {}: {}", path.display(), source);
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Writes the index, replacing any previous file
    pub async fn save(&self, dir: &Path) -> Result<()> {
        write_json_pretty(&Self::path_in(dir), self).await
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, file: impl Into<String>) {
        self.entries.insert(key.into(), file.into());
    }

    /// Registers an artifact under the fingerprint of `params`
    pub fn record(&mut self, params: &ParamSet, file: &str) {
        self.insert(fingerprint(params), file);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries pointing at artifacts of `component` (`<component>-<n>.json`)
    pub fn carry_forward(&self, component: &str) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(_, file)| artifact_number(component, file).is_some())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Entries pointing at artifacts of none of `components`
    ///
    /// Pages sharing an output directory each own the entries of their own
    /// views; this keeps what the other pages wrote.
    pub fn without_components(&self, components: &[&str]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(_, file)| {
                    components
                        .iter()
                        .all(|component| artifact_number(component, file).is_none())
                })
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Merges `newer` into this index; entries of `newer` win on conflict
    pub fn merge(mut self, newer: Self) -> Self {
        self.entries.extend(newer.entries);
        self
    }
}
