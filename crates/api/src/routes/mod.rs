pub mod health;
pub mod jobs;
pub mod traces;

use axum::Router;

use crate::state::AppState;

/// Job and trace routes, mounted at the root next to `/health`.
///
/// ```text
/// /submit, /webhook, /status/{id}, /task/{id}/status, /jobs, /tasks, /queue/status
/// /traces, /trace/{id}
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(jobs::router())
        .merge(traces::router())
}
