#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use columbia_api::config::{LogFormat, ServerConfig};
use columbia_api::router::build_app_router;
use columbia_api::state::AppState;
use columbia_core::submission::{SubmissionContext, SubmissionError, SubmissionProcedure};
use columbia_worker::{Dispatcher, DispatcherConfig};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Procedure that sleeps for `delay_ms` (from the input, default 0) and
/// fails when the input contains `outcome=fail`.
pub struct StubProcedure;

#[async_trait]
impl SubmissionProcedure for StubProcedure {
    async fn submit(&self, ctx: &SubmissionContext) -> Result<(), SubmissionError> {
        let delay_ms: u64 = ctx
            .input
            .get("delay_ms")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        match ctx.input.get("outcome") {
            Some("fail") => Err(SubmissionError::Rejected("portal said no".into())),
            _ => Ok(()),
        }
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        log_format: LogFormat::Text,
    }
}

/// A running test application and the dispatcher behind it.
pub struct TestApp {
    pub router: Router,
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the full application router with the stub procedure.
pub fn build_test_app(trace_dir: &Path) -> TestApp {
    build_test_app_with(trace_dir, DispatcherConfig::default())
}

pub fn build_test_app_with(trace_dir: &Path, dispatcher_config: DispatcherConfig) -> TestApp {
    let config = test_config();
    let dispatcher = Dispatcher::start(&dispatcher_config, Arc::new(StubProcedure));

    let state = AppState {
        config: Arc::new(config.clone()),
        dispatcher: Arc::clone(&dispatcher),
        trace_dir: Arc::new(trace_dir.to_path_buf()),
        max_trace_files: 5,
    };

    TestApp {
        router: build_app_router(state, &config),
        dispatcher,
    }
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: &Router, uri: &str, body: impl Into<String>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A valid submission payload using canonical field names.
pub fn quote_payload() -> serde_json::Value {
    serde_json::json!({
        "person_entering_risk": "John Doe",
        "person_entering_risk_email": "john@example.com",
        "company_name": "Arish LLC",
        "mailing_address": "4964 Lavista Road, Tucker GA",
    })
}

/// Poll `/status/{id}` until the job is terminal.
pub async fn wait_terminal(app: &Router, id: &str) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let json = body_json(get(app, &format!("/status/{id}")).await).await;
        let status = json["data"]["status"].as_str().unwrap_or_default().to_string();
        if status == "completed" || status == "failed" {
            return json["data"].clone();
        }
        assert!(tokio::time::Instant::now() < deadline, "job {id} never finished");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
