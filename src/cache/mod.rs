//! Content cache module
//!
//! A key→value store with a max-age freshness predicate, used to skip remote
//! calls for resources fetched recently.

mod store;

pub use store::{CacheError, CachedValue, ContentCache, CATALOG_CACHE_KEY, DEFAULT_MAX_AGE};
