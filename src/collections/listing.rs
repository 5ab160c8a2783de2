//! Extraction of sub-collections, documents and images from a listing page

use crate::url::{is_remote, resolve_href};
use scraper::{Html, Selector};
use url::Url;

/// What one listing page references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// `data-collection` names of child collections, in page order
    pub sub_collections: Vec<String>,
    /// Document paths (raw `href` values), in page order
    pub documents: Vec<String>,
    /// Resolved image URLs, in page order
    pub images: Vec<Url>,
}

/// Parses a collection listing
///
/// - `.document a[data-collection]` names a child collection. Names that are
///   empty or contain `..` are ignored.
/// - `.document a:not([data-collection])` is a document, unless its `href`
///   ends in `.md` or resolves outside the remote base.
/// - Every `img[src]` is collected, resolved against the remote base.
pub fn parse_listing(body: &str, remote: &Url) -> Listing {
    let html = Html::parse_fragment(body);
    let mut listing = Listing::default();

    if let Ok(selector) = Selector::parse("img[src]") {
        listing.images = html
            .select(&selector)
            .filter_map(|img| img.value().attr("src"))
            .filter_map(|src| resolve_href(src, remote))
            .collect();
    }

    if let Ok(selector) = Selector::parse(".document a[data-collection]") {
        for link in html.select(&selector) {
            let name = link.value().attr("data-collection").unwrap_or_default().trim();
            if name.is_empty() || name.split('/').any(|seg| seg == "..") {
                tracing::warn!("Ignoring collection link '{}'", name);
                continue;
            }
            listing.sub_collections.push(name.to_string());
        }
    }

    if let Ok(selector) = Selector::parse(".document a:not([data-collection])") {
        for link in html.select(&selector) {
            let Some(href) = link.value().attr("href").filter(|h| !h.is_empty()) else {
                continue;
            };
            if href.ends_with(".md") {
                continue;
            }
            match resolve_href(href, remote) {
                Some(url) if is_remote(&url, remote) => listing.documents.push(href.to_string()),
                _ => tracing::debug!("Skipping foreign document link {}", href),
            }
        }
    }

    listing
}
