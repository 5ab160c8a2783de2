//! URL handling module for tei-sync
//!
//! This module provides path-component encoding for API calls and the
//! origin checks and rewrites applied to links found in remote content.

mod encode;
mod rewrite;

// Re-export main functions
pub use encode::encode_component;
pub use rewrite::{is_remote, local_file_path, resolve_href, to_local_path};
