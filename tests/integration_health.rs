#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::clone_on_ref_ptr, unreachable_pub)]
use axum::http::StatusCode;
mod common;
use common::{Behaviour, MockTransport, TestApp};

#[tokio::test]
async fn test_livez() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(format!("{}/livez", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readyz_happy_path() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["transport"], "ok");
    assert_eq!(body["logs"], "ok");
}

#[tokio::test]
async fn test_readyz_transport_error() {
    let app = TestApp::spawn_with_transports(MockTransport::new("primary", Behaviour::Reject), None).await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["transport"], "error");
    assert_eq!(body["logs"], "ok");
}

#[tokio::test]
async fn test_readyz_log_directory_error() {
    let mut config = common::get_test_config();
    let blocker = std::env::temp_dir().join(format!("formrelay-blocker-{}", uuid::Uuid::new_v4()));
    std::fs::write(&blocker, b"not a directory").unwrap();
    config.request_log.dir = blocker.join("logs").to_string_lossy().into_owned();

    let app = TestApp::spawn_with(config, MockTransport::new("primary", Behaviour::Accept), None).await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["transport"], "ok");
    assert_eq!(body["logs"], "error");

    // Requests still succeed when the log cannot be written.
    let resp = app
        .post_json(
            "/contact",
            &serde_json::json!({"name": "Ana", "email": "ana@example.com", "subject": "booking", "message": "Hi"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    std::fs::remove_file(blocker).ok();
}
