//! Typed wrappers around the publisher's API endpoints
//!
//! - `api/document/{path}/meta` → [`DocumentMeta`]
//! - `api/parts/{path}/json` → [`FragmentResponse`]
//! - `api/collection/{path}?start=N` → [`CollectionPage`]
//! - `transform/{name}.css` and image URLs → raw bytes

use crate::client::fetcher::{RemoteClient, ResponseKind};
use crate::url::encode_component;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

/// Response header carrying the total number of collection entries
pub const TOTAL_HEADER: &str = "pb-total";

/// Document metadata as reported by the remote
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "lastModified", default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub odd: Option<String>,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
}

impl DocumentMeta {
    /// The parsed `lastModified` timestamp, if present and well-formed
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified.as_deref().and_then(parse_timestamp)
    }
}

/// Parses an ISO-8601 timestamp as sent by the remote
///
/// Accepts full RFC 3339 timestamps, date-times without an offset (taken as
/// UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// One page of fragment content returned by the parts endpoint
///
/// The raw JSON object is kept as-is so the persisted artifact carries every
/// field the server sent; only `content` is rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentResponse {
    data: Map<String, Value>,
}

impl FragmentResponse {
    /// Wraps a JSON value; non-object payloads are rejected
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(data) => Some(Self { data }),
            _ => None,
        }
    }

    /// The fragment markup, if the server sent a non-empty one
    pub fn content(&self) -> Option<&str> {
        self.data
            .get("content")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn set_content(&mut self, content: String) {
        self.data.insert("content".to_string(), Value::String(content));
    }

    /// Continuation token for the next page, if any
    pub fn next_token(&self) -> Option<String> {
        token_string(self.data.get("next")?)
    }

    /// Element id the server associated with this page, if any
    pub fn id(&self) -> Option<String> {
        token_string(self.data.get("id")?)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

/// Converts a JSON scalar into a query-parameter string
///
/// Null, false and empty strings count as absent.
fn token_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// One page of a collection listing
#[derive(Debug, Clone)]
pub struct CollectionPage {
    /// Raw listing HTML
    pub body: String,
    /// Total number of entries in the collection (`pb-total` header)
    pub total: Option<u64>,
}

impl RemoteClient {
    /// Loads document metadata
    ///
    /// # Returns
    ///
    /// * `Some(DocumentMeta)` - Metadata record found
    /// * `None` - Request failed or the record could not be decoded
    pub async fn load_meta(&self, doc_path: &str) -> Option<DocumentMeta> {
        let path = format!("api/document/{}/meta", encode_component(doc_path));
        let response = self.get(&path, &[], ResponseKind::Json).await?;
        let value = response.body.into_json()?;

        match serde_json::from_value(value) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!("Malformed metadata for {}: {}", doc_path, e);
                None
            }
        }
    }

    /// Fetches one page of fragment content for a document
    pub async fn fetch_fragment(
        &self,
        doc_path: &str,
        query: &[(String, String)],
    ) -> Option<FragmentResponse> {
        let path = format!("api/parts/{}/json", encode_component(doc_path));
        let response = self.get(&path, query, ResponseKind::Json).await?;
        let fragment = response.body.into_json().and_then(FragmentResponse::from_value);

        if fragment.is_none() {
            tracing::warn!("Unexpected fragment payload for {}", doc_path);
        }
        fragment
    }

    /// Fetches one listing page of a collection (`None` = root collection)
    pub async fn fetch_collection(
        &self,
        collection: Option<&str>,
        start: u32,
    ) -> Option<CollectionPage> {
        let path = match collection {
            Some(name) => format!("api/collection/{}", encode_component(name)),
            None => "api/collection/".to_string(),
        };
        let query = [("start".to_string(), start.to_string())];
        let response = self.get(&path, &query, ResponseKind::Text).await?;

        let total = response
            .header(TOTAL_HEADER)
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.body.into_text()?;

        Some(CollectionPage { body, total })
    }

    /// Fetches a resource as text
    pub async fn fetch_text(&self, path: &str) -> Option<String> {
        self.get(path, &[], ResponseKind::Text)
            .await
            .and_then(|response| response.body.into_text())
    }

    /// Fetches a resource as raw bytes
    pub async fn fetch_bytes(&self, url: &Url) -> Option<Vec<u8>> {
        self.get_url(url, &[], ResponseKind::Bytes)
            .await
            .map(|response| response.body.into_bytes())
    }
}
