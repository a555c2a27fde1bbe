//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with worker counters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());
    let response = get(&app.router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "columbia-quote-submitter");
    assert!(json["version"].is_string());
    assert!(json["timestamp"].is_string());
    assert_eq!(json["active_workers"], 0);
    assert_eq!(json["max_workers"], 1);
    assert_eq!(json["queue_size"], 0);
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());
    let response = get(&app.router, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());
    let response = get(&app.router, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

// ---------------------------------------------------------------------------
// Test: CORS preflight allows any origin by default
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/submit")
        .header("Origin", "https://automation.example.com")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
