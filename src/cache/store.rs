//! File-backed content cache
//!
//! Each key is stored as one JSON document under the cache directory, named
//! after the SHA-256 of the key. Entries carry the time they were saved, which
//! is what the freshness predicate compares against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Freshness window used by both cache call sites
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Sentinel key guarding the document catalog
pub const CATALOG_CACHE_KEY: &str = "tp-teidocuments";

/// Errors that can occur while writing cache entries
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A cached value together with its kind
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Text(String),
    Json(serde_json::Value),
}

impl CachedValue {
    fn into_parts(self) -> (EntryKind, serde_json::Value) {
        match self {
            Self::Text(text) => (EntryKind::Text, serde_json::Value::String(text)),
            Self::Json(value) => (EntryKind::Json, value),
        }
    }

    fn from_parts(kind: EntryKind, value: serde_json::Value) -> Option<Self> {
        match (kind, value) {
            (EntryKind::Text, serde_json::Value::String(text)) => Some(Self::Text(text)),
            (EntryKind::Text, _) => None,
            (EntryKind::Json, value) => Some(Self::Json(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EntryKind {
    Text,
    Json,
}

/// On-disk representation of one cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    saved_at: DateTime<Utc>,
    kind: EntryKind,
    value: serde_json::Value,
}

/// Key/value cache with a max-age freshness predicate
#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: PathBuf,
}

impl ContentCache {
    /// Creates a cache rooted at `dir`
    ///
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry file for a key
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Checks whether an entry exists and is younger than `max_age`
    ///
    /// # Returns
    ///
    /// * `true` - A readable entry for this key was saved within `max_age`
    /// * `false` - No entry, a corrupt entry, or an expired one
    pub async fn is_fresh(&self, key: &str, max_age: Duration) -> bool {
        match self.load_entry(key).await {
            Some(entry) => {
                // Entries stamped in the future count as brand new
                let age = (Utc::now() - entry.saved_at)
                    .to_std()
                    .unwrap_or_default();
                age <= max_age
            }
            None => false,
        }
    }

    /// Reads the cached value for a key, regardless of its age
    pub async fn read(&self, key: &str) -> Option<CachedValue> {
        let entry = self.load_entry(key).await?;
        CachedValue::from_parts(entry.kind, entry.value)
    }

    /// Stores a value under a key, stamping it with the current time
    pub async fn write(&self, key: &str, value: CachedValue) -> Result<(), CacheError> {
        let (kind, value) = value.into_parts();
        let entry = CacheEntry {
            key: key.to_string(),
            saved_at: Utc::now(),
            kind,
            value,
        };
        let bytes = serde_json::to_vec(&entry)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!("Cached {}", key);
        Ok(())
    }

    async fn load_entry(&self, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let bytes = tokio::fs::read(&path).await.ok()?;

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.key == key => Some(entry),
            Ok(_) => {
                tracing::warn!("Cache entry {} belongs to another key", path.display());
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                None
            }
        }
    }
}
