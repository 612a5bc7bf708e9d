#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::clone_on_ref_ptr, unreachable_pub)]
use axum::http::StatusCode;
mod common;
use common::{Behaviour, MockTransport, TestApp};

async fn spawn_limited() -> TestApp {
    let mut config = common::get_test_config();
    config.rate_limit.per_second = 1;
    config.rate_limit.burst = 2;
    TestApp::spawn_with(config, MockTransport::new("primary", Behaviour::Accept), None).await
}

async fn lookup(app: &TestApp, client_ip: &str) -> StatusCode {
    app.client
        .get(app.url("/airports"))
        .query(&[("keyword", "b")])
        .header("x-forwarded-for", client_ip)
        .send()
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_rate_limit_throttles_burst() {
    let app = spawn_limited().await;

    assert_eq!(lookup(&app, "203.0.113.10").await, StatusCode::OK);
    assert_eq!(lookup(&app, "203.0.113.10").await, StatusCode::OK);
    assert_eq!(lookup(&app, "203.0.113.10").await, StatusCode::TOO_MANY_REQUESTS);

    assert!(app.read_log("server").contains("[ERROR] Rate limit exceeded on /api/forms/airports"));
}

#[tokio::test]
async fn test_rate_limit_is_per_client_ip() {
    let app = spawn_limited().await;

    for _ in 0..2 {
        assert_eq!(lookup(&app, "203.0.113.20").await, StatusCode::OK);
    }
    assert_eq!(lookup(&app, "203.0.113.20").await, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(lookup(&app, "198.51.100.7").await, StatusCode::OK);
}
