use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Job submission and status routes.
///
/// ```text
/// POST   /submit             -> submit_job
/// POST   /webhook            -> submit_job (legacy)
/// GET    /status/{id}        -> get_job
/// GET    /task/{id}/status   -> get_job (legacy)
/// GET    /jobs               -> list_jobs
/// GET    /tasks              -> list_jobs (legacy)
/// GET    /queue/status       -> queue_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(jobs::submit_job))
        .route("/webhook", post(jobs::submit_job))
        .route("/status/{id}", get(jobs::get_job))
        .route("/task/{id}/status", get(jobs::get_job))
        .route("/jobs", get(jobs::list_jobs))
        .route("/tasks", get(jobs::list_jobs))
        .route("/queue/status", get(jobs::queue_status))
}
