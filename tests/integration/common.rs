//! Shared fixtures for the integration suite

use serde_json::{json, Value};
use std::path::Path;
use tei_sync::config::Config;
use tei_sync::PageContext;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Encoded parts endpoint of the document `works/1`
pub const PARTS_WORKS_1: &str = "/api/parts/works%2F1/json";

/// Encoded metadata endpoint of the document `works/1`
pub const META_WORKS_1: &str = "/api/document/works%2F1/meta";

/// Creates a configuration for the mock server with caching disabled
pub fn test_config(server: &MockServer, site: &Path) -> Config {
    let mut config = Config::for_remote(&server.uri());
    config.sync.output_dir = site.display().to_string();
    config.sync.use_cache = false;
    config
}

/// A page embedding one view `component` of the document `path`
pub fn view_page(component: &str, doc_id: &str, doc_path: &str) -> String {
    format!(
        r#"<html><body>
        <pb-document id="{doc_id}" path="{doc_path}"></pb-document>
        <pb-view id="{component}" src="{doc_id}"></pb-view>
        </body></html>"#
    )
}

/// Context for a page written to `<site>/<relative>`
pub fn page_context(site: &Path, relative: &str) -> PageContext {
    PageContext::new(relative, site.join(relative), site)
}

pub fn meta_body(last_modified: &str) -> Value {
    json!({
        "lastModified": last_modified,
        "odd": "x.odd",
        "view": "div"
    })
}

/// Mounts a metadata response for an encoded document path
pub async fn mount_meta(server: &MockServer, meta_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(meta_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Answers every stylesheet request with an empty sheet
pub async fn mount_stylesheets(server: &MockServer) {
    Mock::given(method("GET"))
        .and(wiremock::matchers::path_regex(r"^/transform/.*\.css$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("/* odd */"))
        .mount(server)
        .await;
}

/// Reads a JSON file written by the publisher
pub fn read_json(path: &Path) -> Value {
    let raw = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&raw).unwrap()
}
