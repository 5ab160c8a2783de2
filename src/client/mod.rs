//! Remote client module
//!
//! This module contains everything that talks to the remote publisher:
//! - A retrying GET wrapper bound to the remote base URL
//! - Typed helpers for the metadata, fragment and collection endpoints

mod api;
mod fetcher;

pub use api::{parse_timestamp, CollectionPage, DocumentMeta, FragmentResponse, TOTAL_HEADER};
pub use fetcher::{
    build_http_client, FetchError, RemoteClient, RemoteResponse, ResponseBody, ResponseKind,
};
