//! Handlers for job submission and status.
//!
//! Submission validates and normalizes the input synchronously, then hands
//! the job to the dispatcher and returns `202 Accepted` without waiting for
//! the portal run.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use columbia_core::error::CoreError;
use columbia_core::job::{JobRecord, JobStatus};
use columbia_core::quote_input::QuoteInput;
use columbia_worker::DispatcherStats;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// The only accepted value of `action`.
pub const START_AUTOMATION: &str = "start_automation";

/// Body of `POST /submit` and `POST /webhook`.
///
/// `task_id` and `quote_data` are accepted for older callers.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default, alias = "task_id")]
    pub job_id: Option<String>,
    #[serde(default, alias = "quote_data")]
    pub input: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub action: Option<String>,
}

/// Returned by a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub queue_position: usize,
    pub status_url: String,
}

/// Payload of `GET /jobs`.
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobRecord>,
    pub total: usize,
    pub active_workers: usize,
    pub max_workers: usize,
    pub queue_size: usize,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /submit
///
/// Returns 202 with the job id and where to poll for status. Malformed JSON
/// and missing required fields are 400s; no record is created for them.
pub async fn submit_job(
    State(state): State<AppState>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(request) = body?;

    if let Some(action) = request.action.as_deref() {
        if action != START_AUTOMATION {
            return Err(AppError::BadRequest(format!("Unknown action: {action}")));
        }
    }

    let input = QuoteInput::from_json(request.input)?;
    let job_id = request
        .job_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    let record = state.dispatcher.submit(job_id, input).await?;

    tracing::info!(
        job_id = %record.id,
        queue_position = record.queue_position,
        "Job submitted",
    );

    let response = SubmitResponse {
        status_url: format!("/status/{}", record.id),
        job_id: record.id,
        status: record.status,
        queue_position: record.queue_position,
    };

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: response })))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /status/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<JobRecord>>> {
    let record = state
        .dispatcher
        .status(&id)
        .await
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Job", id }))?;

    Ok(Json(DataResponse { data: record }))
}

/// GET /jobs
///
/// Every known record, oldest first, plus current worker counters.
pub async fn list_jobs(State(state): State<AppState>) -> Json<DataResponse<JobListResponse>> {
    let jobs = state.dispatcher.list_jobs().await;
    let stats = state.dispatcher.stats();

    Json(DataResponse {
        data: JobListResponse {
            total: jobs.len(),
            jobs,
            active_workers: stats.active_workers,
            max_workers: stats.max_workers,
            queue_size: stats.queue_size,
        },
    })
}

/// GET /queue/status
pub async fn queue_status(State(state): State<AppState>) -> Json<DispatcherStats> {
    Json(state.dispatcher.stats())
}
