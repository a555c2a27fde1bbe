//! Integration tests for job submission and status routes.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use columbia_core::job::{JobRecord, JobStatus};
use columbia_worker::DispatcherConfig;
use common::{body_json, get, post_json, post_raw, quote_payload, wait_terminal};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: submit then poll until completed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_returns_202_and_job_completes() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let response = post_json(
        &app.router,
        "/submit",
        json!({ "job_id": "job-1", "input": quote_payload() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["job_id"], "job-1");
    assert_eq!(json["data"]["status"], "queued");
    assert_eq!(json["data"]["status_url"], "/status/job-1");

    let record = wait_terminal(&app.router, "job-1").await;
    assert_eq!(record["status"], "completed");
    assert_eq!(record["input"]["company_name"], "Arish LLC");
    assert!(record["started_at"].is_string());
    assert!(record["completed_at"].is_string());
    assert!(record.get("error").is_none());
}

// ---------------------------------------------------------------------------
// Test: legacy webhook body with aliases and generated id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn webhook_accepts_legacy_body_and_aliases() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let response = post_json(
        &app.router,
        "/webhook",
        json!({
            "action": "start_automation",
            "quote_data": {
                "contact_name": "Jane Roe",
                "email": "jane@example.com",
                "business_name": "Roe Bakery",
                "address": "1 Main St",
                "square_feet": 2400,
            }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    let job_id = json["data"]["job_id"].as_str().unwrap().to_string();
    assert!(job_id.starts_with("columbia_"));

    let legacy = body_json(get(&app.router, &format!("/task/{job_id}/status")).await).await;
    let input = &legacy["data"]["input"];
    assert_eq!(input["person_entering_risk"], "Jane Roe");
    assert_eq!(input["square_footage"], "2400");
    assert!(input.get("contact_name").is_none());
}

// ---------------------------------------------------------------------------
// Test: missing required field is a 400 and creates nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_required_field_returns_400_without_record() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let mut input = quote_payload();
    input.as_object_mut().unwrap().remove("company_name");

    let response = post_json(
        &app.router,
        "/submit",
        json!({ "job_id": "job-x", "input": input }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("company_name (or business_name)"));

    assert_eq!(
        get(&app.router, "/status/job-x").await.status(),
        StatusCode::NOT_FOUND
    );
    assert!(app.dispatcher.list_jobs().await.is_empty());
}

// ---------------------------------------------------------------------------
// Test: malformed body, bad action, bad id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_json_returns_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let response = post_raw(&app.router, "/submit", "{not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_action_returns_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let response = post_json(
        &app.router,
        "/webhook",
        json!({ "action": "stop_everything", "quote_data": quote_payload() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.dispatcher.list_jobs().await.is_empty());
}

#[tokio::test]
async fn invalid_job_id_returns_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let response = post_json(
        &app.router,
        "/submit",
        json!({ "job_id": "a/b", "input": quote_payload() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: unknown id is a 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_job_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let response = get(&app.router, "/status/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Test: failed submission is visible through status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_job_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let mut input = quote_payload();
    input["outcome"] = json!("fail");
    post_json(&app.router, "/submit", json!({ "job_id": "bad", "input": input })).await;

    let record = wait_terminal(&app.router, "bad").await;
    assert_eq!(record["status"], "failed");
    assert!(record["error"].as_str().unwrap().contains("portal said no"));
    assert!(record["failed_at"].is_string());
}

// ---------------------------------------------------------------------------
// Test: listing and queue status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn jobs_listing_and_queue_status() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let mut slow = quote_payload();
    slow["delay_ms"] = json!("300");
    post_json(&app.router, "/submit", json!({ "job_id": "slow", "input": slow })).await;
    let second = body_json(
        post_json(
            &app.router,
            "/submit",
            json!({ "job_id": "next", "input": quote_payload() }),
        )
        .await,
    )
    .await;
    assert!(second["data"]["queue_position"].as_u64().unwrap() >= 1);

    let listing = body_json(get(&app.router, "/jobs").await).await;
    assert_eq!(listing["data"]["total"], 2);
    assert_eq!(listing["data"]["jobs"][0]["id"], "slow");
    assert_eq!(listing["data"]["max_workers"], 1);

    let legacy = body_json(get(&app.router, "/tasks").await).await;
    assert_eq!(legacy["data"]["total"], 2);

    let queue = body_json(get(&app.router, "/queue/status").await).await;
    assert_eq!(queue["max_workers"], 1);
    assert!(queue["browser_in_use"].is_boolean());

    wait_terminal(&app.router, "next").await;
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    while app.dispatcher.stats().active_workers > 0 {
        assert!(tokio::time::Instant::now() < deadline);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    let queue = body_json(get(&app.router, "/queue/status").await).await;
    assert_eq!(queue["active_workers"], 0);
    assert_eq!(queue["queue_size"], 0);
    assert_eq!(queue["browser_in_use"], false);
}

// ---------------------------------------------------------------------------
// Test: resubmitting an id queues it again and the latest input wins
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resubmitted_job_id_is_run_again() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path());

    let mut slow = quote_payload();
    slow["delay_ms"] = json!("200");
    post_json(&app.router, "/submit", json!({ "job_id": "blocker", "input": slow })).await;

    let mut first = quote_payload();
    first["company_name"] = json!("First Co");
    let mut second = quote_payload();
    second["company_name"] = json!("Second Co");
    for input in [first, second] {
        let response =
            post_json(&app.router, "/submit", json!({ "job_id": "dup", "input": input })).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let record = wait_terminal(&app.router, "dup").await;
    assert_eq!(record["input"]["company_name"], "Second Co");
    assert_eq!(record["trace_label"], "second_co_dup");

    assert_matches!(
        app.dispatcher.status("dup").await,
        Some(JobRecord { status: JobStatus::Completed, .. })
    );
    assert_eq!(app.dispatcher.list_jobs().await.len(), 2);
}

// ---------------------------------------------------------------------------
// Test: queue depth limit returns 503
// ---------------------------------------------------------------------------

#[tokio::test]
async fn queue_depth_limit_returns_503() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with(
        dir.path(),
        DispatcherConfig {
            max_queue_depth: 1,
            ..DispatcherConfig::default()
        },
    );

    let mut slow = quote_payload();
    slow["delay_ms"] = json!("500");
    post_json(&app.router, "/submit", json!({ "job_id": "slow", "input": slow })).await;

    // Wait for the slow job to occupy the slot so the next one stays queued.
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    while app.dispatcher.stats().active_workers == 0 {
        assert!(tokio::time::Instant::now() < deadline);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let queued = post_json(
        &app.router,
        "/submit",
        json!({ "job_id": "queued", "input": quote_payload() }),
    )
    .await;
    assert_eq!(queued.status(), StatusCode::ACCEPTED);

    let refused = post_json(
        &app.router,
        "/submit",
        json!({ "job_id": "refused", "input": quote_payload() }),
    )
    .await;
    assert_eq!(refused.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        get(&app.router, "/status/refused").await.status(),
        StatusCode::NOT_FOUND
    );
}
