mod common;

use axum::http::StatusCode;
use common::{send, spawn_app};

#[tokio::test]
async fn test_health_endpoints_are_public() {
    let (app, _state) = spawn_app().await;

    let (status, body) = send(&app, "GET", "/system/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");

    let (status, body) = send(&app, "GET", "/system/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["checks"]["database"], true);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_disabled_returns_not_found() {
    let (app, _state) = spawn_app().await;

    let (status, body) = send(&app, "GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "metrics are not enabled");
}

#[tokio::test]
async fn test_unknown_path_returns_error_envelope() {
    let (app, _state) = spawn_app().await;

    let (status, body) = send(&app, "GET", "/definitely/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "/definitely/missing not found");
}

#[tokio::test]
async fn test_security_headers_are_set() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let (app, _state) = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/system/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("content-security-policy"));
}
