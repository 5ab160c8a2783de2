//! State module for incremental re-use across runs
//!
//! # Components
//!
//! - `Staleness`: Decides whether a view's artifacts must be fetched again

mod staleness;

pub use staleness::Staleness;
