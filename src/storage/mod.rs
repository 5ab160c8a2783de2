//! Storage module for persisting sync output
//!
//! This module handles everything written to the local site tree:
//! - Page artifacts (`<component>-<n>.json`), written atomically
//! - The per-directory fingerprint index (`index.json`)

mod artifact;
mod index;

pub use artifact::{
    artifact_name, artifact_number, prune_artifacts, read_json, to_pretty_json, write_atomic,
    write_json_pretty,
};
pub use index::{fingerprint, PageIndex, INDEX_FILE};
