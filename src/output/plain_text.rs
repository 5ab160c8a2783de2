//! Built-in plain text indexer

use crate::output::traits::{IndexSource, Indexer};
use crate::ConfigError;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::{json, Value};

/// Subtrees left out of the text unless configured otherwise
pub const DEFAULT_EXCLUDE: &str = "style,script";

/// Extracts the text of an element, skipping subtrees matching `exclude`
///
/// Text nodes are concatenated in document order without adding separators.
pub fn extract_plain_text(element: ElementRef<'_>, exclude: &Selector) -> String {
    let mut out = String::new();
    collect_text(element, exclude, &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, exclude: &Selector, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !exclude.matches(&child_el) {
                        collect_text(child_el, exclude, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Emits one `{file, id?, content}` record per page
#[derive(Debug, Clone)]
pub struct PlainTextIndexer {
    exclude: Selector,
}

impl PlainTextIndexer {
    /// Creates an indexer omitting subtrees matched by `exclude`
    ///
    /// # Errors
    ///
    /// `ConfigError::Validation` if the selector does not parse.
    pub fn new(exclude: Option<&str>) -> Result<Self, ConfigError> {
        let raw = exclude.unwrap_or(DEFAULT_EXCLUDE);
        let exclude = Selector::parse(raw).map_err(|e| {
            ConfigError::Validation(format!("Invalid exclude selector '{}': {}", raw, e))
        })?;
        Ok(Self { exclude })
    }
}

impl Indexer for PlainTextIndexer {
    fn index(&self, fragment: &Html, source: &IndexSource<'_>) -> Vec<Value> {
        let content = extract_plain_text(fragment.root_element(), &self.exclude);

        let mut record = json!({
            "file": source.relative_file(),
            "content": content,
        });
        if let Some(id) = source.page.get("id").filter(|id| !id.is_null()) {
            record["id"] = id.clone();
        }

        vec![record]
    }
}
