//! Collection crawler module
//!
//! This module walks the remote collection hierarchy:
//! - Fetching and storing every listing page, following pagination
//! - Descending into sub-collections
//! - Accumulating document paths into one flat list
//! - Building the template-grouped document catalog

mod catalog;
mod listing;
mod walker;

pub use catalog::{add_entry, build_catalog, Catalog, CatalogEntry};
pub use listing::{parse_listing, Listing};
pub use walker::{CollectionNode, CollectionWalker, CrawlStats, DocList, COLLECTIONS_DIR};
