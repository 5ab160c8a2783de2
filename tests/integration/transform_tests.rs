//! Page transform tests: artifacts, index, staleness and indexers

use crate::common::*;
use serde_json::json;
use tei_sync::config::{IndexerEntry, IndexerKind};
use tei_sync::{Publisher, SyncError};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_single_view_end_to_end() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_meta(&server, META_WORKS_1, meta_body("2024-01-01")).await;
    mount_stylesheets(&server).await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .and(query_param("odd", "x.odd"))
        .and(query_param("view", "div"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": format!(r#"<a href="{}/foo">x</a>"#, server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    let context = page_context(site.path(), "docs/page.html");
    let page = view_page("v1", "docA", "works/1");

    let result = publisher.transform(&page, &context).await.unwrap();
    assert_eq!(result.content, page);
    assert_eq!(result.report.views_refreshed, 1);
    assert_eq!(result.report.artifacts_written, 1);

    let out = site.path().join("docs");
    let artifact = read_json(&out.join("v1-1.json"));
    assert_eq!(artifact["content"], r#"<a href="/foo">x</a>"#);

    let index = read_json(&out.join("index.json"));
    assert_eq!(index, json!({"odd=x.odd&view=div": "v1-1.json"}));

    assert!(site.path().join("css/x.css").exists());
}

#[tokio::test]
async fn test_pagination_stops_at_limit() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_meta(&server, META_WORKS_1, json!({"lastModified": "2024-01-01", "view": "div"})).await;
    for n in 2..=5 {
        Mock::given(method("GET"))
            .and(path(PARTS_WORKS_1))
            .and(query_param("root", format!("t{}", n)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": format!("<p>page {}</p>", n),
                "next": format!("t{}", n + 1)
            })))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": "<p>page 1</p>",
            "next": "t2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server, site.path());
    config.sync.limit = Some(3);
    let publisher = Publisher::new(config).unwrap();
    let context = page_context(site.path(), "page.html");

    let result = publisher
        .transform(&view_page("v1", "d", "works/1"), &context)
        .await
        .unwrap();
    assert_eq!(result.report.artifacts_written, 3);

    for n in 1..=3 {
        assert!(site.path().join(format!("v1-{}.json", n)).exists());
    }
    assert!(!site.path().join("v1-4.json").exists());

    let index = read_json(&site.path().join("index.json"));
    assert_eq!(
        index,
        json!({
            "view=div": "v1-1.json",
            "root=t2&view=div": "v1-2.json",
            "root=t3&view=div": "v1-3.json"
        })
    );
}

#[tokio::test]
async fn test_ids_index_without_pagination_token() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_meta(&server, META_WORKS_1, json!({"lastModified": "2024-01-01", "view": "div"})).await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .and(query_param("root", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": r#"<div id="ch2">two</div>"#
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": r#"<div id="ch1">one</div>"#,
            "next": "t2"
        })))
        .mount(&server)
        .await;

    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    publisher
        .transform(&view_page("v1", "d", "works/1"), &page_context(site.path(), "p.html"))
        .await
        .unwrap();

    let index = read_json(&site.path().join("index.json"));
    assert_eq!(index["id=ch1&view=div"], "v1-1.json");
    assert_eq!(index["id=ch2&view=div"], "v1-2.json");
    assert_eq!(index["root=t2&view=div"], "v1-2.json");
}

#[tokio::test]
async fn test_second_run_reuses_artifacts() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(META_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(meta_body("2001-01-01T00:00:00Z")))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transform/x.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("/* x */"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": r#"<p id="p1">text</p>"#
        })))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    let context = page_context(site.path(), "docs/page.html");
    let page = view_page("v1", "d", "works/1");
    let index_path = site.path().join("docs/index.json");

    let first = publisher.transform(&page, &context).await.unwrap();
    let first_index = std::fs::read(&index_path).unwrap();

    let second = publisher.transform(&page, &context).await.unwrap();
    let second_index = std::fs::read(&index_path).unwrap();

    assert_eq!(first.report.views_refreshed, 1);
    assert_eq!(second.report.views_refreshed, 0);
    assert_eq!(second.report.views_reused, 1);
    assert_eq!(first_index, second_index);
}

#[tokio::test]
async fn test_newer_document_is_fetched_again() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_meta(&server, META_WORKS_1, meta_body("2999-01-01T00:00:00Z")).await;
    mount_stylesheets(&server).await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "<p>x</p>"})))
        .expect(2)
        .mount(&server)
        .await;

    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    let context = page_context(site.path(), "page.html");
    let page = view_page("v1", "d", "works/1");

    publisher.transform(&page, &context).await.unwrap();
    let second = publisher.transform(&page, &context).await.unwrap();
    assert_eq!(second.report.views_refreshed, 1);
}

#[tokio::test]
async fn test_missing_metadata_aborts_page() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(META_WORKS_1))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "<p>x</p>"})))
        .expect(0)
        .mount(&server)
        .await;

    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    let err = publisher
        .transform(&view_page("v1", "d", "works/1"), &page_context(site.path(), "p.html"))
        .await
        .unwrap_err();

    match err {
        SyncError::MissingMetadata { path } => assert_eq!(path, "works/1"),
        other => panic!("Unexpected error: {}", other),
    }
    assert!(!site.path().join("index.json").exists());
}

#[tokio::test]
async fn test_failed_first_page_writes_empty_index() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_meta(&server, META_WORKS_1, json!({"lastModified": "2024-01-01"})).await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    let result = publisher
        .transform(&view_page("v1", "d", "works/1"), &page_context(site.path(), "p.html"))
        .await
        .unwrap();

    assert_eq!(result.report.artifacts_written, 0);
    assert!(!site.path().join("v1-1.json").exists());
    assert_eq!(read_json(&site.path().join("index.json")), json!({}));
}

#[tokio::test]
async fn test_images_stored_relative_to_document() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_meta(&server, META_WORKS_1, json!({"lastModified": "2024-01-01"})).await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": r#"<img src="img/a.png"><img src="http://elsewhere.invalid/b.png">"#
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/works/img/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    let result = publisher
        .transform(&view_page("v1", "d", "works/1"), &page_context(site.path(), "docs/p.html"))
        .await
        .unwrap();

    assert_eq!(result.report.images_written, 1);
    let image = std::fs::read(site.path().join("docs/img/a.png")).unwrap();
    assert_eq!(image, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_plain_text_indexer_appends_records() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_meta(&server, META_WORKS_1, json!({"lastModified": "2024-01-01"})).await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": "<p>Dear <b>sir</b></p><style>p {}</style>",
            "id": "letter-1"
        })))
        .mount(&server)
        .await;

    let mut config = test_config(&server, site.path());
    config.indexers.push(IndexerEntry {
        component: "v1".to_string(),
        kind: IndexerKind::PlainText,
        exclude: None,
    });
    let publisher = Publisher::new(config).unwrap();

    let result = publisher
        .transform(&view_page("v1", "d", "works/1"), &page_context(site.path(), "docs/p.html"))
        .await
        .unwrap();
    assert_eq!(result.report.index_records, 1);

    let jsonl = std::fs::read_to_string(site.path().join("index.jsonl")).unwrap();
    let lines: Vec<&str> = jsonl.lines().collect();
    assert_eq!(lines.len(), 1);

    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["file"], "docs/v1-1.json");
    assert_eq!(record["id"], "letter-1");
    let content = record["content"].as_str().unwrap();
    assert!(content.contains("Dear"));
    assert!(content.contains("sir"));
    assert!(!content.contains("p {}"));
}

#[tokio::test]
async fn test_page_with_unresolved_view_is_left_alone() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    let page = r#"<pb-view id="v1" src="nowhere"></pb-view>"#;
    let result = publisher
        .transform(page, &page_context(site.path(), "p.html"))
        .await
        .unwrap();

    assert_eq!(result.report.views_skipped, 1);
    assert_eq!(read_json(&site.path().join("index.json")), json!({}));
    assert!(server.received_requests().await.unwrap().is_empty());
}

fn two_view_page() -> String {
    r#"<html><body>
    <pb-document id="d1" path="works/1"></pb-document>
    <pb-document id="d2" path="works/2"></pb-document>
    <pb-view id="v1" src="d1"></pb-view>
    <pb-view id="v2" src="d2"></pb-view>
    </body></html>"#
        .to_string()
}

async fn mount_two_documents(server: &MockServer, second_meta: Option<serde_json::Value>) {
    mount_meta(server, META_WORKS_1, json!({"lastModified": "2001-01-01", "view": "div"})).await;
    match second_meta {
        Some(body) => mount_meta(server, "/api/document/works%2F2/meta", body).await,
        None => {
            Mock::given(method("GET"))
                .and(path("/api/document/works%2F2/meta"))
                .respond_with(ResponseTemplate::new(404))
                .mount(server)
                .await
        }
    }
    for (parts, content) in [(PARTS_WORKS_1, "<p>one</p>"), ("/api/parts/works%2F2/json", "<p>two</p>")] {
        Mock::given(method("GET"))
            .and(path(parts))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": content})))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_aborted_page_leaves_no_unindexed_artifacts() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();
    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    let context = page_context(site.path(), "p.html");

    mount_two_documents(&server, None).await;
    let err = publisher.transform(&two_view_page(), &context).await.unwrap_err();
    assert!(matches!(err, SyncError::MissingMetadata { .. }));
    assert!(!site.path().join("v1-1.json").exists());

    server.reset().await;
    mount_two_documents(&server, Some(json!({"lastModified": "2001-01-01", "view": "page"}))).await;
    let result = publisher.transform(&two_view_page(), &context).await.unwrap();

    assert_eq!(result.report.views_refreshed, 2);
    assert_eq!(
        read_json(&site.path().join("index.json")),
        json!({"view=div": "v1-1.json", "view=page": "v2-1.json"})
    );
}

#[tokio::test]
async fn test_unindexed_artifact_is_fetched_again() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_meta(&server, META_WORKS_1, json!({"lastModified": "2001-01-01", "view": "div"})).await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "<p>x</p>"})))
        .expect(1)
        .mount(&server)
        .await;

    // Artifact newer than the document, but no index entry pointing at it
    std::fs::write(site.path().join("v1-1.json"), "{}").unwrap();
    std::fs::write(site.path().join("index.json"), "{}").unwrap();

    let publisher = Publisher::new(test_config(&server, site.path())).unwrap();
    let result = publisher
        .transform(&view_page("v1", "d", "works/1"), &page_context(site.path(), "p.html"))
        .await
        .unwrap();

    assert_eq!(result.report.views_refreshed, 1);
    assert_eq!(
        read_json(&site.path().join("index.json")),
        json!({"view=div": "v1-1.json"})
    );
}

#[tokio::test]
async fn test_shrunk_document_is_not_reindexed_from_old_pages() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    let mut config = test_config(&server, site.path());
    config.indexers.push(IndexerEntry {
        component: "v1".to_string(),
        kind: IndexerKind::PlainText,
        exclude: None,
    });
    let publisher = Publisher::new(config).unwrap();
    let context = page_context(site.path(), "p.html");
    let page = view_page("v1", "d", "works/1");

    mount_meta(&server, META_WORKS_1, json!({"lastModified": "2999-01-01", "view": "div"})).await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .and(query_param("root", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "<p>old two</p>"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": "<p>old one</p>",
            "next": "t2"
        })))
        .mount(&server)
        .await;
    publisher.transform(&page, &context).await.unwrap();
    assert!(site.path().join("v1-2.json").exists());

    server.reset().await;
    mount_meta(&server, META_WORKS_1, json!({"lastModified": "2999-01-01", "view": "div"})).await;
    Mock::given(method("GET"))
        .and(path(PARTS_WORKS_1))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "<p>new</p>"})))
        .mount(&server)
        .await;
    let second = publisher.transform(&page, &context).await.unwrap();

    assert_eq!(second.report.index_records, 1);
    assert!(!site.path().join("v1-2.json").exists());
    assert_eq!(read_json(&site.path().join("index.json")), json!({"view=div": "v1-1.json"}));

    let jsonl = std::fs::read_to_string(site.path().join("index.jsonl")).unwrap();
    let last: serde_json::Value = serde_json::from_str(jsonl.lines().last().unwrap()).unwrap();
    let content = last["content"].as_str().unwrap();
    assert!(content.contains("new"));
    assert!(!content.contains("old"));
    assert_eq!(jsonl.lines().count(), 3);
}
