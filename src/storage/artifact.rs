//! Artifact file helpers
//!
//! All files are written through a temporary sibling and renamed into place,
//! so readers never observe a truncated artifact.

use crate::{Result, SyncError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};

/// File name of page `number` of a component
///
/// ```
/// use tei_sync::storage::artifact_name;
///
/// assert_eq!(artifact_name("v1", 3), "v1-3.json");
/// ```
pub fn artifact_name(component: &str, number: u32) -> String {
    format!("{}-{}.json", component, number)
}

/// Parses `<component>-<n>.json` back into its page number
pub fn artifact_number(component: &str, file_name: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(component)?
        .strip_prefix('-')?
        .strip_suffix(".json")?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Writes bytes atomically, creating parent directories as needed
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Removes artifacts of `component` numbered above `keep`
///
/// Used after a refresh, when the document now has fewer pages than before.
///
/// # Returns
///
/// * `Ok(n)` - Number of files removed
/// * `Err(io::Error)` - Listing the directory or removing a file failed
pub async fn prune_artifacts(dir: &Path, component: &str, keep: u32) -> std::io::Result<u32> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(number) = name.to_str().and_then(|n| artifact_number(component, n)) else {
            continue;
        };
        if number > keep {
            tokio::fs::remove_file(entry.path()).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Serializes a value as JSON indented by four spaces
pub fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Writes a value as pretty JSON, atomically
pub async fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = to_pretty_json(value)?;
    write_atomic(path, &bytes).await?;
    Ok(())
}

/// Reads a JSON file
///
/// # Returns
///
/// * `Ok(Some(value))` - File exists and parsed
/// * `Ok(None)` - File does not exist
/// * `Err(SyncError::Json)` - File exists but is malformed
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| SyncError::Json {
            path: path.to_path_buf(),
            source,
        })
}
