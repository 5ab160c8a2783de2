//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests against the remote publisher:
//! - Building the HTTP client with timeout and identity encoding
//! - Resolving API paths against the remote base URL
//! - Retry logic for transient failures
//! - Error classification
//!
//! Failures never propagate as errors from [`RemoteClient::get`]: they are
//! logged with the failing URL and surface as `None`, so callers skip the
//! affected unit of work.

use crate::config::RemoteConfig;
use crate::SyncError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// How the response body should be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Text,
    Bytes,
    Json,
}

/// A decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl ResponseBody {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(bytes) => String::from_utf8(bytes).ok(),
            Self::Json(value) => Some(value.to_string()),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
            Self::Json(value) => value.to_string().into_bytes(),
        }
    }

    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(text) => serde_json::from_str(&text).ok(),
            Self::Bytes(bytes) => serde_json::from_slice(&bytes).ok(),
        }
    }
}

/// A successful (2xx) response
#[derive(Debug)]
pub struct RemoteResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Decoded body
    pub body: ResponseBody,
}

impl RemoteResponse {
    /// Returns a header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Classified request failure
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {error}")]
    Network { url: String, error: String },

    #[error("Failed to decode response from {url}: {error}")]
    Decode { url: String, error: String },
}

impl FetchError {
    /// The URL of the failing request
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. }
            | Self::Timeout { url }
            | Self::Network { url, .. }
            | Self::Decode { url, .. } => url,
        }
    }

    /// Timeouts and server errors are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Network { .. } | Self::Decode { .. } => false,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Compressed transfer is disabled (`Accept-Encoding: identity`); the
/// publisher streams raw fragments and images.
pub fn build_http_client(config: &RemoteConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(concat!("tei-sync/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// GET wrapper bound to the remote base URL
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Success |
/// | HTTP 5xx | Retry up to `max-retries` times |
/// | Timeout | Retry up to `max-retries` times |
/// | Other HTTP status | Immediate failure |
/// | Connection error | Immediate failure |
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: Client,
    base: Url,
    max_retries: u32,
    retry_delay: Duration,
}

impl RemoteClient {
    /// Creates a client for the configured remote
    pub fn new(config: &RemoteConfig) -> Result<Self, SyncError> {
        let base = config.base_url()?;
        let client = build_http_client(config)?;

        Ok(Self {
            client,
            base,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        })
    }

    /// The remote base URL (always ends in `/`)
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolves a relative API path (or an absolute URL) against the base
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }

    /// Issues a GET for a path relative to the remote base
    ///
    /// # Returns
    ///
    /// * `Some(RemoteResponse)` - The request succeeded with a 2xx status
    /// * `None` - The request failed; the failure has been logged
    pub async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        kind: ResponseKind,
    ) -> Option<RemoteResponse> {
        let url = match self.resolve(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot resolve {} against {}: {}", path, self.base, e);
                return None;
            }
        };
        self.get_url(&url, query, kind).await
    }

    /// Issues a GET for an absolute URL, logging any failure
    pub async fn get_url(
        &self,
        url: &Url,
        query: &[(String, String)],
        kind: ResponseKind,
    ) -> Option<RemoteResponse> {
        match self.try_get(url, query, kind).await {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(url = %e.url(), "Request failed: {}", e);
                None
            }
        }
    }

    /// Issues a GET and returns the classified failure instead of logging it
    pub async fn try_get(
        &self,
        url: &Url,
        query: &[(String, String)],
        kind: ResponseKind,
    ) -> Result<RemoteResponse, FetchError> {
        let mut attempt = 0;
        loop {
            match self.send_once(url, query, kind).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} (attempt {}/{}): {}",
                        e.url(),
                        attempt,
                        self.max_retries,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                result => return result,
            }
        }
    }

    async fn send_once(
        &self,
        url: &Url,
        query: &[(String, String)],
        kind: ResponseKind,
    ) -> Result<RemoteResponse, FetchError> {
        tracing::debug!("Fetching {}", url);

        let mut request = self.client.get(url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(url.as_str(), e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: final_url,
                status: status.as_u16(),
            });
        }

        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_error(&final_url, e))?;

        let body = match kind {
            ResponseKind::Bytes => ResponseBody::Bytes(bytes.to_vec()),
            ResponseKind::Text => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
            ResponseKind::Json => {
                let value = serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
                    url: final_url.clone(),
                    error: e.to_string(),
                })?;
                ResponseBody::Json(value)
            }
        };

        Ok(RemoteResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            error: format!("Connection failed: {}", e),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            error: e.to_string(),
        }
    }
}
