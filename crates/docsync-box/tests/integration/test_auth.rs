//! Integration tests for client-credentials authentication

use std::sync::Arc;

use docsync_box::auth::{BoxAuth, BoxCredentials, BoxSubject};
use docsync_box::client::BoxClient;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> BoxCredentials {
    BoxCredentials {
        client_id: "client-123".into(),
        client_secret: "secret-456".into(),
        subject: BoxSubject::User("261171497".into()),
    }
}

async fn mount_token(server: &MockServer, token: &str, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("box_subject_type=user"))
        .and(body_string_contains("box_subject_id=261171497"))
        .and(body_string_contains("client_id=client-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "expires_in": expires_in,
            "token_type": "bearer",
            "restricted_to": []
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_token() {
    let server = MockServer::start().await;
    mount_token(&server, "service-token", 3600).await;

    let auth = BoxAuth::new(credentials(), &format!("{}/oauth2/token", server.uri())).unwrap();
    let token = auth.fetch_token().await.unwrap();

    assert_eq!(token.secret, "service-token");
    assert!(!token.is_expiring(chrono::Utc::now()));
}

#[tokio::test]
async fn test_token_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "cached-token",
            "expires_in": 3600,
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = BoxAuth::new(credentials(), &format!("{}/oauth2/token", server.uri())).unwrap();
    assert_eq!(auth.access_token().await.unwrap(), "cached-token");
    assert_eq!(auth.access_token().await.unwrap(), "cached-token");
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "The client credentials are invalid"
        })))
        .mount(&server)
        .await;

    let auth = BoxAuth::new(credentials(), &format!("{}/oauth2/token", server.uri())).unwrap();
    let err = auth.fetch_token().await.unwrap_err();
    assert!(err.to_string().contains("Token request failed"));
}

#[tokio::test]
async fn test_client_uses_service_token() {
    let server = MockServer::start().await;
    mount_token(&server, "service-token", 3600).await;
    Mock::given(method("GET"))
        .and(path("/files/1"))
        .and(header("Authorization", "Bearer service-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "file", "id": "1", "content_modified_at": "2026-10-10T10:00:00-04:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Arc::new(
        BoxAuth::new(credentials(), &format!("{}/oauth2/token", server.uri())).unwrap(),
    );
    let client = BoxClient::new(auth, server.uri());
    let file = client.get_file("1").await.unwrap();
    assert!(file.content_modified_at.is_some());
}

#[tokio::test]
async fn test_unauthorized_refreshes_token_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "token",
            "expires_in": 3600,
            "token_type": "bearer"
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/folders/1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let auth = Arc::new(
        BoxAuth::new(credentials(), &format!("{}/oauth2/token", server.uri())).unwrap(),
    );
    let client = BoxClient::new(auth, server.uri());
    let err = client.get_folder("1").await.unwrap_err();
    assert!(format!("{err:#}").contains("Unauthorized"));
}
