mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use booking_service::services::MockMailRelay;
use common::{test_config, TestApp};
use serde_json::json;

#[tokio::test]
async fn greeting_works_with_and_without_trailing_slash() {
    let app = TestApp::spawn();

    for uri in ["/api", "/api/"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Hello World" }));
    }
}

#[tokio::test]
async fn health_check_reports_dependencies() {
    let app = TestApp::spawn();

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "booking-service");
    assert_eq!(body["checks"]["mongodb"], "up");
    assert_eq!(body["checks"]["smtp"], "configured");
}

#[tokio::test]
async fn health_check_is_degraded_without_store_or_credentials() {
    let app = TestApp::build(test_config(false), MockMailRelay::new(), false);

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["mongodb"], "disconnected");
    assert_eq!(body["checks"]["smtp"], "missing_credentials");
}

#[tokio::test]
async fn readiness_follows_store() {
    let ready = TestApp::spawn();
    let (status, _) = ready.get("/ready").await;
    assert_eq!(status, StatusCode::OK);

    let not_ready = TestApp::build(test_config(true), MockMailRelay::new(), false);
    let (status, _) = not_ready.get("/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::spawn();

    let (status, body) = app.get("/api/unknown").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("/api/unknown"));
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::spawn();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::builder()
            .uri("/api/")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn cors_preflight_is_permissive_for_wildcard() {
    let app = TestApp::spawn();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::builder()
            .method("OPTIONS")
            .uri("/api/booking")
            .header("origin", "https://themaplin.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert!(response.status().is_success());
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn cors_echoes_listed_origin() {
    let mut config = test_config(true);
    config.cors.allowed_origins = booking_service::config::AllowedOrigins::List(vec![
        "https://themaplin.com".to_string(),
    ]);
    let app = TestApp::build(config, MockMailRelay::new(), true);

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::builder()
            .uri("/api/")
            .header("origin", "https://themaplin.com")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://themaplin.com"
    );
    assert_eq!(response.headers()["access-control-allow-credentials"], "true");
}
