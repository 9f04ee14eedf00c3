//! Integration tests for the HTTP transport.
//!
//! These tests run [`HttpApi`] against a wiremock server and verify:
//! - Request paths, headers and JSON:API bodies
//! - Status mapping (404 -> NotFound, 401 -> Unauthorized, others -> Remote)
//! - The lookup-or-create flow end to end

#![cfg(feature = "http")]

use serde_json::json;
use tfcbind_core::{
    ApiError, ClientError, Connector, CredentialsStore, HttpApi, HttpConnector, WorkspaceApi,
    WorkspaceClient, WorkspaceCreateOptions, WorkspaceId, resolve_session_for,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

const JSON_API: &str = "application/vnd.api+json";

/// Helper to connect an HTTP client to the mock server.
fn connect(server: &MockServer) -> HttpApi {
    let host = server.address().to_string();
    let store = CredentialsStore::new().with_token(host, "t0ken");
    let session = resolve_session_for(Some(&server.uri()), &store).unwrap();
    HttpConnector::new().connect(&session).unwrap()
}

fn workspace_body(id: &str, name: &str) -> serde_json::Value {
    json!({
        "data": {
            "id": id,
            "type": "workspaces",
            "attributes": {
                "name": name,
                "auto-apply": true,
                "created-at": "2024-05-01T12:00:00.000Z"
            }
        }
    })
}

#[tokio::test]
async fn test_read_organization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme"))
        .and(header("authorization", "Bearer t0ken"))
        .and(header("accept", JSON_API))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "acme",
                "type": "organizations",
                "attributes": { "name": "acme", "email": "ops@acme.test" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let org = connect(&server).read_organization("acme").await.unwrap();

    assert_eq!(org.name, "acme");
    assert_eq!(org.email.as_deref(), Some("ops@acme.test"));
}

#[tokio::test]
async fn test_missing_organization_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{ "status": "404", "title": "not found" }]
        })))
        .mount(&server)
        .await;

    let err = connect(&server).read_organization("acme").await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_read_workspace_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme/workspaces/prod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(workspace_body("ws-1", "prod")))
        .mount(&server)
        .await;

    let workspace = connect(&server).read_workspace("acme", "prod").await.unwrap();

    assert_eq!(workspace.id.as_str(), "ws-1");
    assert_eq!(workspace.name, "prod");
    assert!(workspace.auto_apply);
    assert!(workspace.created_at.is_some());
}

#[tokio::test]
async fn test_create_workspace_sends_json_api_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/organizations/acme/workspaces"))
        .and(header("content-type", JSON_API))
        .and(body_json(json!({
            "data": {
                "type": "workspaces",
                "attributes": { "name": "staging", "auto-apply": true }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(workspace_body("ws-2", "staging")))
        .expect(1)
        .mount(&server)
        .await;

    let workspace = connect(&server)
        .create_workspace("acme", &WorkspaceCreateOptions::new("staging"))
        .await
        .unwrap();

    assert_eq!(workspace.id.as_str(), "ws-2");
}

#[tokio::test]
async fn test_validation_error_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/organizations/acme/workspaces"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{
                "status": "422",
                "title": "invalid attribute",
                "detail": "Name has already been taken"
            }]
        })))
        .mount(&server)
        .await;

    let err = connect(&server)
        .create_workspace("acme", &WorkspaceCreateOptions::new("prod"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Remote {
            status: 422,
            message: "Name has already been taken".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/workspaces/ws-1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = connect(&server)
        .read_workspace_by_id(&WorkspaceId::new("ws-1"))
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::Unauthorized);
}

#[tokio::test]
async fn test_delete_workspace() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v2/workspaces/ws-2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    connect(&server)
        .delete_workspace_by_id(&WorkspaceId::new("ws-2"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_name_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = connect(&server).read_workspace("acme", "a/b").await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidArgument { field: "workspace", .. }));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/workspaces/ws-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = connect(&server)
        .read_workspace_by_id(&WorkspaceId::new("ws-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }));
}

#[tokio::test]
async fn test_resolve_creates_after_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme/workspaces/staging"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/organizations/acme/workspaces"))
        .respond_with(ResponseTemplate::new(201).set_body_json(workspace_body("ws-2", "staging")))
        .expect(1)
        .mount(&server)
        .await;

    let client = WorkspaceClient::with_api(connect(&server), "acme", "secret/tfc");
    let id = client.resolve_workspace("staging").await.unwrap();

    assert_eq!(id.as_str(), "ws-2");
}

#[tokio::test]
async fn test_resolve_server_error_does_not_create() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme/workspaces/prod"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = WorkspaceClient::with_api(connect(&server), "acme", "secret/tfc");
    let err = client.resolve_workspace("prod").await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Api(ApiError::Remote { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_empty_error_body_uses_status_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = connect(&server).read_organization("acme").await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Remote {
            status: 500,
            message: "Internal Server Error".to_string(),
        }
    );
}
