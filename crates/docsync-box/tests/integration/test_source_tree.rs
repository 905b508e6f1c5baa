//! Integration tests for BoxSourceTree against a mock Box API

use docsync_box::client::BoxClient;
use docsync_box::provider::BoxSourceTree;
use docsync_core::domain::{FileId, FolderId, NodeKind};
use docsync_core::ports::ISourceTree;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

fn folder(id: &str) -> FolderId {
    FolderId::new(id).unwrap()
}

fn file(id: &str) -> FileId {
    FileId::new(id).unwrap()
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_children_maps_entries() {
    let (server, client) = common::setup_box_mock().await;
    common::mount_items_page(
        &server,
        "100",
        0,
        serde_json::json!([
            {"type": "file", "id": "1", "name": "a.PDF", "modified_at": "2026-10-13T09:00:00-07:00"},
            {"type": "folder", "id": "2", "name": "Reports"},
            {"type": "web_link", "id": "3", "name": "Intranet"}
        ]),
    )
    .await;

    let tree = BoxSourceTree::new(client);
    let nodes = tree.list_children(&folder("100"), 1000, 0).await.unwrap();

    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].id.as_str(), "1");
    assert_eq!(nodes[0].name, "a.PDF");
    assert_eq!(nodes[0].kind, NodeKind::File);
    assert_eq!(
        nodes[0].modified_at.unwrap().to_rfc3339(),
        "2026-10-13T09:00:00-07:00"
    );
    assert_eq!(nodes[1].kind, NodeKind::Folder);
    assert_eq!(nodes[2].kind, NodeKind::Other);
}

#[tokio::test]
async fn test_list_children_sends_paging_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/folders/100/items"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "4"))
        .and(query_param("fields", "id,type,name,modified_at"))
        .and(header("Authorization", "Bearer test-access-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"total_count": 4, "entries": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tree = BoxSourceTree::new(BoxClient::with_base_url("test-access-token", server.uri()));
    let nodes = tree.list_children(&folder("100"), 2, 4).await.unwrap();
    assert!(nodes.is_empty());
}

#[tokio::test]
async fn test_as_user_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/folders/7"))
        .and(header("As-User", "261171497"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "folder", "id": "7", "modified_at": "2026-10-12T08:00:00-07:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = BoxClient::with_base_url("tok", server.uri()).as_user("261171497");
    let tree = BoxSourceTree::new(client);
    tree.get_folder(&folder("7")).await.unwrap();
}

#[tokio::test]
async fn test_missing_folder_is_an_error() {
    let (server, client) = common::setup_box_mock().await;
    Mock::given(method("GET"))
        .and(path("/folders/404/items"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not_found"))
        .mount(&server)
        .await;

    let tree = BoxSourceTree::new(client);
    let err = tree.list_children(&folder("404"), 1000, 0).await.unwrap_err();
    assert!(format!("{err:#}").contains("Not found"));
}

#[tokio::test]
async fn test_rate_limited_listing_is_retried() {
    let (server, client) = common::setup_box_mock().await;
    Mock::given(method("GET"))
        .and(path("/folders/5/items"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    common::mount_items_page(
        &server,
        "5",
        0,
        serde_json::json!([{"type": "file", "id": "9", "name": "x.txt"}]),
    )
    .await;

    let tree = BoxSourceTree::new(client);
    let nodes = tree.list_children(&folder("5"), 1000, 0).await.unwrap();
    assert_eq!(nodes.len(), 1);
}

#[tokio::test]
async fn test_rate_limit_exhaustion_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/folders/5/items"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .mount(&server)
        .await;

    let client = BoxClient::with_base_url("tok", server.uri()).with_max_retries(1);
    let tree = BoxSourceTree::new(client);
    let err = tree.list_children(&folder("5"), 1000, 0).await.unwrap_err();
    assert!(err.to_string().contains("Too many requests"));
}

// ============================================================================
// Metadata and download
// ============================================================================

#[tokio::test]
async fn test_get_folder_returns_modified_at() {
    let (server, client) = common::setup_box_mock().await;
    common::mount_folder(&server, "7", "2026-10-12T08:00:00-07:00").await;

    let tree = BoxSourceTree::new(client);
    let info = tree.get_folder(&folder("7")).await.unwrap();
    assert_eq!(info.modified_at.to_rfc3339(), "2026-10-12T08:00:00-07:00");
}

#[tokio::test]
async fn test_get_file_content_modified_at() {
    let (server, client) = common::setup_box_mock().await;
    common::mount_file(&server, "11", Some("2026-10-10T10:00:00-04:00")).await;
    common::mount_file(&server, "12", None).await;

    let tree = BoxSourceTree::new(client);
    let with_ts = tree.get_file(&file("11")).await.unwrap();
    let without_ts = tree.get_file(&file("12")).await.unwrap();

    assert!(with_ts.content_modified_at.is_some());
    assert!(without_ts.content_modified_at.is_none());
}

#[tokio::test]
async fn test_download_returns_content() {
    let (server, client) = common::setup_box_mock().await;
    let content = b"%PDF-1.7 test document";
    common::mount_download(&server, "21", content).await;

    let tree = BoxSourceTree::new(client);
    let data = tree.download(&file("21")).await.unwrap();
    assert_eq!(data, content);
}

#[tokio::test]
async fn test_download_server_error() {
    let (server, client) = common::setup_box_mock().await;
    Mock::given(method("GET"))
        .and(path("/files/22/content"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let tree = BoxSourceTree::new(client);
    let err = tree.download(&file("22")).await.unwrap_err();
    assert!(format!("{err:#}").contains("Server error"));
}
