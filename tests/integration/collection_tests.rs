//! Collection crawl and catalog tests

use crate::common::*;
use serde_json::json;
use tei_sync::Publisher;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROOT_LISTING: &str = "/api/collection/";

fn listing(body: &str, total: Option<u32>) -> ResponseTemplate {
    let response = ResponseTemplate::new(200).set_body_string(body.to_string());
    match total {
        Some(total) => response.insert_header("pb-total", total.to_string().as_str()),
        None => response,
    }
}

/// Root collection: 25 entries over three listing pages, one child collection
async fn mount_hierarchy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(ROOT_LISTING))
        .and(query_param("start", "1"))
        .respond_with(listing(
            r##"<div class="document"><a data-collection="letters" href="#">Letters</a></div>
               <div class="document"><a href="works/1">Work</a><img src="icons/w.png"></div>
               <div class="document"><a href="readme.md">Readme</a></div>"##,
            Some(25),
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(ROOT_LISTING))
        .and(query_param("start", "11"))
        .respond_with(listing(
            r#"<div class="document"><a href="http://elsewhere.invalid/x.xml">X</a></div>"#,
            Some(25),
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(ROOT_LISTING))
        .and(query_param("start", "21"))
        .respond_with(listing(
            r#"<div class="document"><a href="works/2">Work 2</a></div>"#,
            Some(25),
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/collection/letters"))
        .and(query_param("start", "1"))
        .respond_with(listing(
            r#"<div class="document"><a href="letters/a.xml">A</a></div>"#,
            None,
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/icons/w.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_writes_listings_and_catalog() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();
    mount_hierarchy(&server).await;

    mount_meta(
        &server,
        META_WORKS_1,
        json!({"lastModified": "2024-01-01", "odd": "dta.odd", "template": "letter.html"}),
    )
    .await;
    mount_meta(&server, "/api/document/letters%2Fa.xml/meta", json!({"view": "page"})).await;
    Mock::given(method("GET"))
        .and(path("/api/document/works%2F2/meta"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = test_config(&server, site.path());
    config.sync.collections = true;
    let publisher = Publisher::new(config).unwrap();

    let catalog = publisher.fetch_collections(site.path()).await.unwrap();

    let collections = site.path().join("collections");
    for start in [1, 11, 21] {
        assert!(collections.join(format!("{}.html", start)).exists());
    }
    assert!(!collections.join("31.html").exists());
    assert!(collections.join("letters/1.html").exists());
    assert!(site.path().join("icons/w.png").exists());

    assert_eq!(
        serde_json::to_value(&catalog).unwrap(),
        json!({
            "letter": [
                {"path": "works/1", "odd": "dta", "view": "div", "template": "letter"}
            ],
            "view": [
                {"path": "works/2", "odd": "teipublisher", "view": "div", "template": "view"},
                {"path": "letters/a.xml", "odd": "teipublisher", "view": "page", "template": "view"}
            ]
        })
    );
}

#[tokio::test]
async fn test_listing_pages_fetched_before_children() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();
    mount_hierarchy(&server).await;
    Mock::given(method("GET"))
        .and(wiremock::matchers::path_regex(r"^/api/document/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = test_config(&server, site.path());
    config.sync.collections = true;
    let publisher = Publisher::new(config).unwrap();
    publisher.fetch_collections(site.path()).await.unwrap();

    let listings: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/api/collection/"))
        .map(|r| format!("{}?{}", r.url.path(), r.url.query().unwrap_or_default()))
        .collect();

    assert_eq!(
        listings,
        [
            "/api/collection/?start=1",
            "/api/collection/?start=11",
            "/api/collection/?start=21",
            "/api/collection/letters?start=1",
        ]
    );
}

#[tokio::test]
async fn test_cached_catalog_skips_metadata() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    mount_hierarchy(&server).await;

    Mock::given(method("GET"))
        .and(wiremock::matchers::path_regex(r"^/api/document/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"template": "t.html"})))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = test_config(&server, site.path());
    config.sync.collections = true;
    config.sync.use_cache = true;
    config.sync.cache_dir = cache.path().display().to_string();
    let publisher = Publisher::new(config).unwrap();

    let first = publisher.fetch_collections(site.path()).await.unwrap();
    let second = publisher.fetch_collections(site.path()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first["t"].len(), 3);
}

#[tokio::test]
async fn test_collections_disabled_skips_crawl() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    let catalog = publisher.fetch_collections(site.path()).await.unwrap();

    assert!(catalog.is_empty());
    assert!(!site.path().join("collections").exists());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_returns_marker_on_failure() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("8.0.0"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = test_config(&server, site.path());
    config.sync.use_cache = true;
    config.sync.cache_dir = cache.path().display().to_string();
    let publisher = Publisher::new(config).unwrap();

    let url = format!("{}/api/version", server.uri());
    assert_eq!(publisher.fetch(&url).await, "8.0.0");
    assert_eq!(publisher.fetch(&url).await, "8.0.0");

    let missing = format!("{}/missing", server.uri());
    assert_eq!(
        publisher.fetch(&missing).await,
        format!("Failed to fetch {}", missing)
    );
}
