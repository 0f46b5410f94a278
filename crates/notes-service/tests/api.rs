//! End-to-end tests for the note endpoints, driven through the router

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};
use tower::ServiceExt;

use notes_service::config::AuthConfig;
use notes_service::note::Note;
use notes_service::store::{DocumentStore, NoteStore, StoreError};
use notes_service::{router, AppState};

const UNKNOWN_ID: &str = "65a1b2c3d4e5f60718293a4b";

fn app_with(store: Arc<dyn NoteStore>) -> Router {
    router(Arc::new(AppState::new(store, AuthConfig::default())))
}

fn app() -> Router {
    app_with(Arc::new(DocumentStore::in_memory()))
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic("username", "password"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn create_note(app: &Router, title: &str, content: &str) -> Value {
    let (status, body) = send(
        app,
        request("POST", "/notes", Some(json!({ "title": title, "content": content }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

// ==================== Authentication ====================

#[tokio::test]
async fn test_missing_credentials_rejected() {
    let app = app();
    let req = Request::builder()
        .method("GET")
        .uri("/notes")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"Authorization Required\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Unauthorized");
}

#[tokio::test]
async fn test_wrong_credentials_rejected_on_every_route() {
    let app = app();
    let routes = [
        ("GET", "/notes".to_string()),
        ("POST", "/notes".to_string()),
        ("GET", format!("/notes/{}", UNKNOWN_ID)),
        ("PUT", format!("/notes/{}", UNKNOWN_ID)),
        ("DELETE", format!("/notes/{}", UNKNOWN_ID)),
        ("GET", "/not-a-route".to_string()),
    ];

    for (method, uri) in routes {
        let req = Request::builder()
            .method(method)
            .uri(&uri)
            .header(header::AUTHORIZATION, basic("username", "wrong"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} should require auth",
            method,
            uri
        );
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }
}

#[tokio::test]
async fn test_configured_credentials_accepted() {
    let auth = AuthConfig {
        username: "admin".to_string(),
        password: "s3cret".to_string(),
        realm: "Notes".to_string(),
    };
    let app = router(Arc::new(AppState::new(
        Arc::new(DocumentStore::in_memory()),
        auth,
    )));

    let req = Request::builder()
        .method("GET")
        .uri("/notes")
        .header(header::AUTHORIZATION, basic("admin", "s3cret"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The default pair no longer works
    let (status, _) = send(&app, request("GET", "/notes", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ==================== Create ====================

#[tokio::test]
async fn test_create_note() {
    let app = app();
    let body = create_note(&app, "Test Note", "This is a test note.").await;

    assert_eq!(body["title"], "Test Note");
    assert_eq!(body["content"], "This is a test note.");
    assert_eq!(body["id"].as_str().unwrap().len(), 24);
}

#[tokio::test]
async fn test_create_missing_field_is_bad_request() {
    let app = app();

    for payload in [
        json!({ "title": "Incomplete Note" }),
        json!({ "content": "No title here" }),
        json!({ "title": "", "content": "Empty title" }),
        json!({}),
    ] {
        let (status, body) = send(&app, request("POST", "/notes", Some(payload))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Title and content are required");
    }
}

#[tokio::test]
async fn test_create_unparseable_body_is_bad_request() {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/notes")
        .header(header::AUTHORIZATION, basic("username", "password"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title and content are required");
}

#[tokio::test]
async fn test_create_too_short_reports_details() {
    let app = app();
    let (status, body) = send(
        &app,
        request("POST", "/notes", Some(json!({ "title": "ab", "content": "abcd" }))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["details"]["title"]["kind"], "minlength");
    assert_eq!(body["details"]["content"]["kind"], "minlength");
}

#[tokio::test]
async fn test_create_too_long_is_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/notes",
            Some(json!({ "title": "x".repeat(1001), "content": "valid content" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["title"]["kind"], "maxlength");
    assert!(body["details"].get("content").is_none());
}

#[tokio::test]
async fn test_create_accepts_max_length() {
    let app = app();
    let title = "t".repeat(1000);
    let content = "c".repeat(1000);
    let body = create_note(&app, &title, &content).await;
    assert_eq!(body["title"], title);
    assert_eq!(body["content"], content);
}

// ==================== List ====================

#[tokio::test]
async fn test_list_empty_is_not_found() {
    let app = app();
    let (status, body) = send(&app, request("GET", "/notes", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No notes found");
}

#[tokio::test]
async fn test_list_after_create() {
    let app = app();
    let created = create_note(&app, "Test Note", "This is a test note.").await;

    let (status, body) = send(&app, request("GET", "/notes", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([created]));
}

// ==================== Get ====================

#[tokio::test]
async fn test_get_round_trip() {
    let app = app();
    let created = create_note(&app, "Test Note", "This is a test note.").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, request("GET", &format!("/notes/{}", id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);
}

#[tokio::test]
async fn test_get_malformed_id_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, request("GET", "/notes/nonexistentnoteid", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid note ID");
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let app = app();
    let (status, body) = send(&app, request("GET", &format!("/notes/{}", UNKNOWN_ID), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Note not found");
}

// ==================== Update ====================

#[tokio::test]
async fn test_update_then_get_reflects_change() {
    let app = app();
    let created = create_note(&app, "Test Note", "This is a test note.").await;
    let uri = format!("/notes/{}", created["id"].as_str().unwrap());

    let update = json!({
        "title": "Updated Test Note",
        "content": "This is an updated test note.",
    });
    let (status, body) = send(&app, request("PUT", &uri, Some(update))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], created["id"]);
    assert_eq!(body["title"], "Updated Test Note");
    assert_eq!(body["content"], "This is an updated test note.");

    let (status, fetched) = send(&app, request("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn test_update_missing_field_checked_before_id() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/notes/nonexistentnoteid",
            Some(json!({ "title": "Updated Note" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title and content are required");
}

#[tokio::test]
async fn test_update_malformed_id_is_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/notes/nonexistentnoteid",
            Some(json!({ "title": "Updated Note", "content": "Updated content" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid note ID");
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let app = app();
    let (status, _) = send(
        &app,
        request(
            "PUT",
            &format!("/notes/{}", UNKNOWN_ID),
            Some(json!({ "title": "Updated Note", "content": "Updated content" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_validation_failure_keeps_note() {
    let app = app();
    let created = create_note(&app, "Test Note", "This is a test note.").await;
    let uri = format!("/notes/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(json!({ "title": "Updated", "content": "tiny" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["details"]["content"]["kind"], "minlength");

    let (_, fetched) = send(&app, request("GET", &uri, None)).await;
    assert_eq!(fetched, created);
}

// ==================== Delete ====================

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = app();
    let created = create_note(&app, "Test Note", "This is a test note.").await;
    let uri = format!("/notes/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, request("DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    let (status, _) = send(&app, request("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, request("DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_malformed_id_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, request("DELETE", "/notes/nonexistentnoteid", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid note ID");
}

// ==================== Store failures ====================

/// Store whose every operation fails as if the disk went away
struct BrokenStore;

fn broken() -> StoreError {
    StoreError::Io(std::io::Error::other("storage unavailable"))
}

#[async_trait]
impl NoteStore for BrokenStore {
    async fn create(&self, _title: &str, _content: &str) -> Result<Note, StoreError> {
        Err(broken())
    }

    async fn list_all(&self) -> Result<Vec<Note>, StoreError> {
        Err(broken())
    }

    async fn get_by_id(&self, _id: &str) -> Result<Note, StoreError> {
        Err(broken())
    }

    async fn update_by_id(&self, _id: &str, _title: &str, _content: &str) -> Result<Note, StoreError> {
        Err(broken())
    }

    async fn delete_by_id(&self, _id: &str) -> Result<Note, StoreError> {
        Err(broken())
    }
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let app = app_with(Arc::new(BrokenStore));
    let uri = format!("/notes/{}", UNKNOWN_ID);
    let payload = json!({ "title": "Test Note", "content": "This is a test note." });

    let requests = [
        request("POST", "/notes", Some(payload.clone())),
        request("GET", "/notes", None),
        request("GET", &uri, None),
        request("PUT", &uri, Some(payload)),
        request("DELETE", &uri, None),
    ];

    for req in requests {
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
    }
}

// ==================== Persistence ====================

#[tokio::test]
async fn test_notes_persist_across_store_reopen() {
    let temp = tempfile::TempDir::new().unwrap();

    let created = {
        let store = DocumentStore::open(temp.path()).await.unwrap();
        let app = app_with(Arc::new(store));
        create_note(&app, "Durable", "survives a restart").await
    };

    let store = DocumentStore::open(temp.path()).await.unwrap();
    let app = app_with(Arc::new(store));
    let uri = format!("/notes/{}", created["id"].as_str().unwrap());
    let (status, body) = send(&app, request("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);
}
