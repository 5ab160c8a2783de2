//! Template-grouped catalog of discovered documents

use crate::client::{DocumentMeta, RemoteClient};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_ODD: &str = "teipublisher";
const DEFAULT_VIEW: &str = "div";
const DEFAULT_TEMPLATE: &str = "view";

/// One document in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub path: String,
    pub odd: String,
    pub view: String,
    pub template: String,
}

/// Template name → entries in discovery order
pub type Catalog = BTreeMap<String, Vec<CatalogEntry>>;

impl CatalogEntry {
    /// Entry for a document whose metadata could not be loaded
    pub fn defaults(path: &str) -> Self {
        Self {
            path: path.to_string(),
            odd: DEFAULT_ODD.to_string(),
            view: DEFAULT_VIEW.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Builds an entry from metadata, falling back to defaults per field
    ///
    /// The `.odd` suffix is stripped from the ODD and `.html` from the
    /// template.
    pub fn from_meta(path: &str, meta: Option<&DocumentMeta>) -> Self {
        let mut entry = Self::defaults(path);
        let Some(meta) = meta else {
            return entry;
        };

        if let Some(odd) = meta.odd.as_deref().filter(|s| !s.is_empty()) {
            entry.odd = odd.strip_suffix(".odd").unwrap_or(odd).to_string();
        }
        if let Some(view) = meta.view.as_deref().filter(|s| !s.is_empty()) {
            entry.view = view.to_string();
        }
        if let Some(template) = meta.template.as_deref().filter(|s| !s.is_empty()) {
            entry.template = template.strip_suffix(".html").unwrap_or(template).to_string();
        }
        entry
    }
}

/// Adds an entry under its template, keeping insertion order
pub fn add_entry(catalog: &mut Catalog, entry: CatalogEntry) {
    catalog.entry(entry.template.clone()).or_default().push(entry);
}

/// Loads metadata for every path and groups the entries by template
///
/// Missing metadata degrades the entry to the default profile instead of
/// failing the catalog.
pub async fn build_catalog(client: &RemoteClient, paths: &[String]) -> Catalog {
    let mut catalog = Catalog::new();

    tracing::debug!("Retrieving metadata for {} documents", paths.len());
    for path in paths {
        let meta = client.load_meta(path).await;
        if meta.is_none() {
            tracing::warn!("Using default profile for {}", path);
        }
        add_entry(&mut catalog, CatalogEntry::from_meta(path, meta.as_ref()));
    }

    catalog
}
