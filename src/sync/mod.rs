//! Sync module - page transforms and their orchestration
//!
//! This module contains the incremental fetch/transform pipeline:
//! - `Publisher`: entry point for page transforms, fetches and collections
//! - `Pager` / `retrieve_view`: the pagination loop for one view
//! - Image and stylesheet downloads
//! - `WorkQueue` / `DirLocks`: bounded admission and per-directory locking

mod assets;
mod publisher;
mod retriever;
mod scheduler;

pub use assets::{download_images, ensure_stylesheet, stylesheet_path};
pub use publisher::{PageContext, Publisher, TransformedPage};
pub use retriever::{document_url, retrieve_view, FetchedPage, Pager, RetrievedView};
pub use scheduler::{DirLocks, WorkQueue};
