//! Staleness decisions for previously produced view artifacts
//!
//! A view is refreshed when its first-page artifact is missing or older than
//! the remote document; otherwise the artifacts on disk are reused as-is.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;

/// Outcome of comparing a remote document against local artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Staleness {
    /// Fetch every page again
    Refresh,

    /// Keep the artifacts and carry their index entries forward
    Reuse,
}

impl Staleness {
    pub fn is_refresh(&self) -> bool {
        matches!(self, Self::Refresh)
    }

    /// Decides from the remote timestamp and the first artifact's mtime
    ///
    /// # Rules
    ///
    /// | Artifact | `lastModified` | Result |
    /// |----------|----------------|--------|
    /// | missing | any | Refresh |
    /// | present | missing or unparseable | Refresh |
    /// | present | strictly newer than mtime | Refresh |
    /// | present | equal or older | Reuse |
    pub fn decide(
        last_modified: Option<DateTime<Utc>>,
        artifact_mtime: Option<DateTime<Utc>>,
    ) -> Self {
        match (last_modified, artifact_mtime) {
            (Some(remote), Some(local)) if remote <= local => Self::Reuse,
            _ => Self::Refresh,
        }
    }

    /// Checks a view's first-page artifact on disk
    pub async fn check(last_modified: Option<DateTime<Utc>>, first_page: &Path) -> Self {
        let mtime = match tokio::fs::metadata(first_page).await {
            Ok(meta) => meta.modified().ok().map(DateTime::<Utc>::from),
            Err(_) => None,
        };
        Self::decide(last_modified, mtime)
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Refresh => "refresh",
            Self::Reuse => "reuse",
        };
        write!(f, "{}", s)
    }
}
