//! Rewriting of fetched fragment markup
//!
//! Pure: no I/O happens here. Image downloads are deferred by pushing the
//! resolved URLs into an accumulator owned by the caller.

use crate::url::{resolve_href, to_local_path};
use scraper::{Html, Node, Selector};
use url::Url;

/// Result of transforming one fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedFragment {
    /// Rewritten markup
    pub content: String,
    /// `id` attributes in document order
    pub ids: Vec<String>,
}

/// Rewrites links in a fragment and collects images and element ids
///
/// # Arguments
///
/// * `content` - Fragment markup as returned by the parts endpoint
/// * `base` - URL relative references are resolved against
/// * `remote` - Configured remote base; only links under it are rewritten
/// * `images` - Accumulator receiving the resolved URL of every `img[src]`
///
/// # Link Rewriting
///
/// An `a[href]` whose resolved URL lies under `remote` is rewritten to a
/// root-relative path with the remote base stripped. Query and fragment are
/// kept. Every other link is left untouched.
pub fn transform_fragment(
    content: &str,
    base: &Url,
    remote: &Url,
    images: &mut Vec<Url>,
) -> TransformedFragment {
    let mut html = Html::parse_fragment(content);
    let mut ids = Vec::new();
    let mut rewrites = Vec::new();

    if let Ok(img_selector) = Selector::parse("img[src]") {
        for img in html.select(&img_selector) {
            if let Some(url) = img.value().attr("src").and_then(|s| resolve_href(s, base)) {
                images.push(url);
            }
        }
    }

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for link in html.select(&a_selector) {
            let local = link
                .value()
                .attr("href")
                .and_then(|href| resolve_href(href, base))
                .and_then(|url| to_local_path(&url, remote));

            if let Some(local) = local {
                rewrites.push((link.id(), local));
            }
        }
    }

    if let Ok(id_selector) = Selector::parse("[id]") {
        ids.extend(
            html.select(&id_selector)
                .filter_map(|el| el.value().id())
                .map(str::to_string),
        );
    }

    for (node_id, href) in rewrites {
        if let Some(mut node) = html.tree.get_mut(node_id) {
            if let Node::Element(element) = node.value() {
                for (name, value) in element.attrs.iter_mut() {
                    if &*name.local == "href" {
                        *value = href.as_str().into();
                    }
                }
            }
        }
    }

    TransformedFragment {
        content: html.root_element().inner_html(),
        ids,
    }
}
