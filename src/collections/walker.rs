//! Crawl of the remote collection hierarchy
//!
//! Each collection node fetches all of its listing pages before any child is
//! visited; children are then visited depth-first in listing order. The crawl
//! is sequential and driven by an explicit stack, so arbitrarily deep
//! hierarchies do not grow the call stack.

use crate::client::RemoteClient;
use crate::collections::listing::parse_listing;
use crate::storage::write_atomic;
use crate::sync::download_images;
use crate::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Name of the directory listing pages are stored under
pub const COLLECTIONS_DIR: &str = "collections";

/// One collection to visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNode {
    /// Collection path (`None` for the root collection)
    pub collection: Option<String>,
    /// Where images referenced by the listing are stored
    pub root_dir: PathBuf,
    /// Where listing pages are stored (`<dir>/<start>.html`)
    pub dir: PathBuf,
}

impl CollectionNode {
    /// The root collection of a site rooted at `base_dir`
    pub fn root(base_dir: &Path) -> Self {
        Self {
            collection: None,
            root_dir: base_dir.to_path_buf(),
            dir: base_dir.join(COLLECTIONS_DIR),
        }
    }

    /// The child collection `name` below this one
    pub fn child(&self, name: &str) -> Self {
        let collection = match &self.collection {
            Some(parent) => format!("{}/{}", parent, name),
            None => name.to_string(),
        };
        Self {
            collection: Some(collection),
            root_dir: self.root_dir.join(name),
            dir: self.dir.join(name),
        }
    }

    /// Display name used in log lines
    pub fn label(&self) -> &str {
        self.collection.as_deref().unwrap_or("/")
    }
}

/// Document paths discovered during a crawl, in discovery order
///
/// One list is shared by the whole crawl. The caller owns it and hands it to
/// [`CollectionWalker::crawl`] by mutable reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocList {
    paths: Vec<String>,
}

impl DocList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>) {
        self.paths.push(path.into());
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }
}

impl Extend<String> for DocList {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.paths.extend(iter);
    }
}

/// Counters for one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub collections: u32,
    pub listing_pages: u32,
    pub images: u32,
}

/// Sequential walker over the collection tree
pub struct CollectionWalker<'a> {
    client: &'a RemoteClient,
    page_size: u32,
}

impl<'a> CollectionWalker<'a> {
    /// Creates a walker
    ///
    /// # Arguments
    ///
    /// * `client` - Remote client for listing and image requests
    /// * `page_size` - Entries per listing page, used to compute the next `start`
    pub fn new(client: &'a RemoteClient, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    /// Crawls the whole hierarchy below the root collection
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - Crawl finished; failed listing pages were skipped
    /// * `Err(SyncError)` - Writing a listing page or image failed
    pub async fn crawl(&self, base_dir: &Path, docs: &mut DocList) -> Result<CrawlStats> {
        let mut stats = CrawlStats::default();
        let mut visited = HashSet::new();
        let mut stack = vec![CollectionNode::root(base_dir)];

        while let Some(node) = stack.pop() {
            if !visited.insert(node.collection.clone()) {
                tracing::warn!("Collection {} already visited", node.label());
                continue;
            }

            let children = self.visit(&node, docs, &mut stats).await?;
            stats.collections += 1;

            for child in children.iter().rev() {
                stack.push(node.child(child));
            }
        }

        tracing::info!(
            "Crawled {} collections ({} listing pages, {} documents)",
            stats.collections,
            stats.listing_pages,
            docs.len()
        );
        Ok(stats)
    }

    /// Fetches every listing page of one node and returns its children
    async fn visit(
        &self,
        node: &CollectionNode,
        docs: &mut DocList,
        stats: &mut CrawlStats,
    ) -> Result<Vec<String>> {
        tokio::fs::create_dir_all(&node.dir).await?;
        let remote = self.client.base_url();
        let mut children = Vec::new();
        let mut start: u32 = 1;

        loop {
            tracing::info!("Retrieving collection {}; start = {}", node.label(), start);
            let Some(page) = self
                .client
                .fetch_collection(node.collection.as_deref(), start)
                .await
            else {
                break;
            };

            write_atomic(&node.dir.join(format!("{}.html", start)), page.body.as_bytes()).await?;
            stats.listing_pages += 1;

            let listing = parse_listing(&page.body, remote);
            stats.images += download_images(self.client, &listing.images, remote, &node.root_dir).await?;
            docs.extend(listing.documents);
            children.extend(listing.sub_collections);

            match page.total {
                Some(total) if u64::from(start) + u64::from(self.page_size) < total => {
                    start += self.page_size;
                }
                _ => break,
            }
        }

        Ok(children)
    }
}
