//! Route-level tests for the demo log API, driven through `tower::ServiceExt`.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use tunglog_api::ApiLog;
use tunglog_api::server::{AppState, router};

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_reports_running() {
    let (status, body) = send(router(AppState::seeded()), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Server API is running now!");
}

#[tokio::test]
async fn health_reports_ok_with_time() {
    let (status, body) = send(router(AppState::seeded()), get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["time"].is_string());
}

#[tokio::test]
async fn seeded_list_contains_startup_entry() {
    let (status, body) = send(router(AppState::seeded()), get("/api/logs")).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["log_type"], "INFO");
    assert_eq!(entries[0]["log_message"], "API server started");
    assert_eq!(entries[0]["hostname"], "local-api");
    assert!(entries[0]["created_at"].is_string());
}

#[tokio::test]
async fn wrapped_list_nests_entries_under_data() {
    let (status, body) = send(router(AppState::seeded()), get("/api/logs_wrapped")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn posted_entries_are_appended_and_stamped() {
    let state = AppState::with_logs(Vec::new());
    let payload = json!([
        {"log_type": "ERROR", "log_message": "disk full", "hostname": "db-1"},
        {"log_type": "DEBUG", "log_message": "cache miss", "created_at": "2024-03-01T10:00:00Z"}
    ]);

    let (status, body) = send(router(state.clone()), post_json("/api/logs", &payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], 2);

    let stored = state.snapshot().await;
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].log_message, "disk full");
    assert!(stored[0].created_at.is_some());
    assert_eq!(
        stored[1].created_at.unwrap().to_rfc3339(),
        "2024-03-01T10:00:00+00:00"
    );

    let (_, listed) = send(router(state), get("/api/logs")).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn posting_a_non_list_is_rejected() {
    let state = AppState::with_logs(vec![ApiLog::new("INFO", "keep me")]);
    let (status, _) = send(
        router(state.clone()),
        post_json("/api/logs", &json!({"log_type": "INFO"})),
    )
    .await;

    assert!(status.is_client_error());
    assert_eq!(state.snapshot().await.len(), 1);
}
