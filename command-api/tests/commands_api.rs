//! HTTP contract tests for the command endpoints
//!
//! Requests go through the full router and middleware stack with the
//! in-memory store behind it.

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use command_api::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

fn app_with(repo: InMemoryCommandRepository, config: Config) -> Router {
    build_router(AppState::new(config, repo))
}

fn seeded() -> (Router, InMemoryCommandRepository) {
    let repo = InMemoryCommandRepository::with_commands([Command::new("mock", "Mock", "Mock")]);
    (app_with(repo.clone(), Config::default()), repo)
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: Body,
) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        request = request.header(header::CONTENT_TYPE, content_type);
    }

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    TestResponse {
        status,
        headers,
        body: body.to_vec(),
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    match body {
        Some(body) => {
            send_raw(
                app,
                method,
                uri,
                Some("application/json"),
                Body::from(body.to_string()),
            )
            .await
        }
        None => send_raw(app, method, uri, None, Body::empty()).await,
    }
}

#[tokio::test]
async fn list_on_empty_store_returns_empty_array() {
    let app = app_with(InMemoryCommandRepository::new(), Config::default());

    let response = send(&app, Method::GET, "/commands", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([]));
}

#[tokio::test]
async fn list_returns_commands_in_store_order() {
    let repo = InMemoryCommandRepository::with_commands([
        Command::new("List files", "Linux", "ls -la"),
        Command::new("List files", "Windows", "dir"),
    ]);
    let app = app_with(repo, Config::default());

    let response = send(&app, Method::GET, "/commands", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!([
            {"id": 1, "howTo": "List files", "platform": "Linux", "commandLine": "ls -la"},
            {"id": 2, "howTo": "List files", "platform": "Windows", "commandLine": "dir"},
        ])
    );
}

#[tokio::test]
async fn created_command_is_retrievable_at_location() {
    let app = app_with(InMemoryCommandRepository::new(), Config::default());

    let created = send(
        &app,
        Method::POST,
        "/commands",
        Some(json!({"howTo": "Show disk usage", "platform": "Linux", "commandLine": "df -h"})),
    )
    .await;

    assert_eq!(created.status, StatusCode::CREATED);
    let location = created.headers[header::LOCATION].to_str().unwrap().to_string();
    assert_eq!(location, "/commands/1");
    assert_eq!(
        created.json(),
        json!({"id": 1, "howTo": "Show disk usage", "platform": "Linux", "commandLine": "df -h"})
    );

    let fetched = send(&app, Method::GET, &location, None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json(), created.json());
}

#[tokio::test]
async fn create_with_missing_fields_is_unprocessable() {
    let repo = InMemoryCommandRepository::new();
    let app = app_with(repo.clone(), Config::default());

    let response = send(
        &app,
        Method::POST,
        "/commands",
        Some(json!({"howTo": "   ", "platform": null})),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["status"], 422);
    for field in ["howTo", "platform", "commandLine"] {
        assert_eq!(body["errors"][field][0]["code"], "REQUIRED", "field {}", field);
    }
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn create_with_malformed_json_is_bad_request() {
    let app = app_with(InMemoryCommandRepository::new(), Config::default());

    let response = send_raw(
        &app,
        Method::POST,
        "/commands",
        Some("application/json"),
        Body::from("{\"howTo\": "),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_without_json_content_type_is_rejected() {
    let app = app_with(InMemoryCommandRepository::new(), Config::default());

    let response = send_raw(
        &app,
        Method::POST,
        "/commands",
        Some("text/plain"),
        Body::from(json!({"howTo": "a", "platform": "b", "commandLine": "c"}).to_string()),
    )
    .await;

    assert!(response.status.is_client_error());
    assert_ne!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn get_missing_command_is_not_found_with_empty_body() {
    let (app, _) = seeded();

    let response = send(&app, Method::GET, "/commands/42", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn non_numeric_id_is_bad_request() {
    let (app, _) = seeded();

    let response = send(&app, Method::GET, "/commands/abc", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mutations_on_missing_id_are_not_found_and_change_nothing() {
    let (app, repo) = seeded();
    let before = repo.snapshot().await;

    let put = send(
        &app,
        Method::PUT,
        "/commands/7",
        Some(json!({"howTo": "a", "platform": "b", "commandLine": "c"})),
    )
    .await;
    let put_invalid = send(&app, Method::PUT, "/commands/7", Some(json!({}))).await;
    let patch = send(
        &app,
        Method::PATCH,
        "/commands/7",
        Some(json!([{"op": "replace", "path": "/howTo", "value": "x"}])),
    )
    .await;
    let patch_invalid = send(
        &app,
        Method::PATCH,
        "/commands/7",
        Some(json!([{"op": "remove", "path": "/howTo"}])),
    )
    .await;
    let delete = send(&app, Method::DELETE, "/commands/7", None).await;

    for response in [put, put_invalid, patch, patch_invalid, delete] {
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.body.is_empty());
    }
    assert_eq!(repo.snapshot().await, before);
}

#[tokio::test]
async fn full_update_replaces_fields_and_keeps_id() {
    let (app, _) = seeded();

    let response = send(
        &app,
        Method::PUT,
        "/commands/1",
        Some(json!({"howTo": "List files", "platform": "Windows", "commandLine": "dir /a"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());

    let fetched = send(&app, Method::GET, "/commands/1", None).await;
    assert_eq!(
        fetched.json(),
        json!({"id": 1, "howTo": "List files", "platform": "Windows", "commandLine": "dir /a"})
    );
}

#[tokio::test]
async fn full_update_with_empty_field_is_unprocessable() {
    let (app, repo) = seeded();

    let response = send(
        &app,
        Method::PUT,
        "/commands/1",
        Some(json!({"howTo": "x", "platform": "", "commandLine": "y"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.json()["errors"]["platform"].is_array());
    assert_eq!(repo.snapshot().await[0].platform, "Mock");
}

#[tokio::test]
async fn patch_replace_updates_single_field() {
    let (app, _) = seeded();

    let response = send(
        &app,
        Method::PATCH,
        "/commands/1",
        Some(json!([{"op": "replace", "path": "/howTo", "value": "updated"}])),
    )
    .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let fetched = send(&app, Method::GET, "/commands/1", None).await;
    assert_eq!(
        fetched.json(),
        json!({"id": 1, "howTo": "updated", "platform": "Mock", "commandLine": "Mock"})
    );
}

#[tokio::test]
async fn patch_accepts_json_patch_media_type() {
    let (app, repo) = seeded();

    let response = send_raw(
        &app,
        Method::PATCH,
        "/commands/1",
        Some("application/json-patch+json"),
        Body::from(
            json!([
                {"op": "test", "path": "/platform", "value": "Mock"},
                {"op": "copy", "from": "/platform", "path": "/commandLine"},
                {"op": "replace", "path": "/platform", "value": "Linux"}
            ])
            .to_string(),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        repo.snapshot().await,
        vec![Command::new("mock", "Linux", "Mock").with_id(1)]
    );
}

#[tokio::test]
async fn empty_patch_is_no_content() {
    let (app, repo) = seeded();
    let before = repo.snapshot().await;

    let response = send(&app, Method::PATCH, "/commands/1", Some(json!([]))).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(repo.snapshot().await, before);
}

#[tokio::test]
async fn patch_with_invalid_path_is_unprocessable_and_atomic() {
    let (app, repo) = seeded();
    let before = repo.snapshot().await;

    let response = send(
        &app,
        Method::PATCH,
        "/commands/1",
        Some(json!([
            {"op": "replace", "path": "/howTo", "value": "changed"},
            {"op": "replace", "path": "/unknownField", "value": "x"}
        ])),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json();
    assert_eq!(
        body["errors"]["/unknownField"][0]["code"],
        "INVALID_PATCH_OPERATION"
    );
    assert_eq!(repo.snapshot().await, before);
}

#[tokio::test]
async fn patch_with_failed_test_is_unprocessable() {
    let (app, repo) = seeded();
    let before = repo.snapshot().await;

    let response = send(
        &app,
        Method::PATCH,
        "/commands/1",
        Some(json!([
            {"op": "test", "path": "/howTo", "value": "something else"},
            {"op": "replace", "path": "/howTo", "value": "changed"}
        ])),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["errors"]["/howTo"][0]["code"], "TEST_FAILED");
    assert_eq!(repo.snapshot().await, before);
}

#[tokio::test]
async fn patch_emptying_required_field_is_unprocessable() {
    let (app, repo) = seeded();
    let before = repo.snapshot().await;

    let response = send(
        &app,
        Method::PATCH,
        "/commands/1",
        Some(json!([{"op": "replace", "path": "/commandLine", "value": ""}])),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.json()["errors"]["commandLine"][0]["code"],
        "REQUIRED"
    );
    assert_eq!(repo.snapshot().await, before);
}

#[tokio::test]
async fn patch_with_unknown_op_is_bad_request() {
    let (app, _) = seeded();

    let response = send(
        &app,
        Method::PATCH,
        "/commands/1",
        Some(json!([{"op": "frobnicate", "path": "/howTo"}])),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_with_object_body_is_bad_request() {
    let (app, _) = seeded();

    let response = send(
        &app,
        Method::PATCH,
        "/commands/1",
        Some(json!({"howTo": "not a patch"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let (app, repo) = seeded();

    let deleted = send(&app, Method::DELETE, "/commands/1", None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(deleted.body.is_empty());

    let fetched = send(&app, Method::GET, "/commands/1", None).await;
    assert_eq!(fetched.status, StatusCode::NOT_FOUND);
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn failed_commit_is_server_error_and_invisible() {
    let (app, repo) = seeded();
    let before = repo.snapshot().await;
    repo.set_fail_commits(true);

    let created = send(
        &app,
        Method::POST,
        "/commands",
        Some(json!({"howTo": "a", "platform": "b", "commandLine": "c"})),
    )
    .await;
    let updated = send(
        &app,
        Method::PATCH,
        "/commands/1",
        Some(json!([{"op": "replace", "path": "/howTo", "value": "updated"}])),
    )
    .await;
    let deleted = send(&app, Method::DELETE, "/commands/1", None).await;

    for response in [created, updated, deleted] {
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json();
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("in-memory"));
    }

    repo.set_fail_commits(false);
    let listed = send(&app, Method::GET, "/commands", None).await;
    assert_eq!(listed.json().as_array().unwrap().len(), before.len());
    assert_eq!(repo.snapshot().await, before);
}

#[tokio::test]
async fn create_after_last_id_is_server_error() {
    let repo = InMemoryCommandRepository::with_commands([
        Command::new("last", "Linux", "ls").with_id(CommandId::MAX)
    ]);
    let app = app_with(repo.clone(), Config::default());

    let response = send(
        &app,
        Method::POST,
        "/commands",
        Some(json!({"howTo": "a", "platform": "b", "commandLine": "c"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["code"], "INTERNAL_ERROR");
    assert!(response.headers.get(header::LOCATION).is_none());

    let ids: Vec<_> = repo.snapshot().await.into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![CommandId::MAX]);
}

#[tokio::test]
async fn base_path_prefixes_routes_and_location() {
    let mut config = Config::default();
    config.service.base_path = "/api".to_string();
    let app = app_with(InMemoryCommandRepository::new(), config);

    let created = send(
        &app,
        Method::POST,
        "/api/commands",
        Some(json!({"howTo": "a", "platform": "b", "commandLine": "c"})),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.headers[header::LOCATION], "/api/commands/1");

    let fetched = send(&app, Method::GET, "/api/commands/1", None).await;
    assert_eq!(fetched.status, StatusCode::OK);

    let unprefixed = send(&app, Method::GET, "/commands", None).await;
    assert_eq!(unprefixed.status, StatusCode::NOT_FOUND);

    let health = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let (app, _) = seeded();

    let generated = send(&app, Method::GET, "/commands", None).await;
    let id = generated.headers["x-request-id"].to_str().unwrap();
    assert!(id.parse::<RequestId>().is_ok());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/commands/1")
                .header("x-request-id", "client-supplied")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "client-supplied");
}

#[tokio::test]
async fn health_and_readiness_probes() {
    let (app, _) = seeded();

    let health = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    let body = health.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "command-api");

    let ready = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.json()["ready"], true);
}
