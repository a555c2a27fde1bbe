use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use columbia_core::error::CoreError;
use serde::Serialize;

use crate::artifacts::{self, TraceFile};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Payload of `GET /traces`.
#[derive(Debug, Serialize)]
pub struct TraceListResponse {
    pub total: usize,
    pub max_traces: usize,
    pub traces: Vec<TraceFile>,
}

/// GET /traces
///
/// Trace archives on disk, newest first.
pub async fn list_traces(State(state): State<AppState>) -> AppResult<Json<TraceListResponse>> {
    let dir = state.trace_dir.as_ref().clone();
    let traces = tokio::task::spawn_blocking(move || artifacts::trace_archives(&dir))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .map_err(|e| AppError::InternalError(format!("Failed to read trace directory: {e}")))?;

    Ok(Json(TraceListResponse {
        total: traces.len(),
        max_traces: state.max_trace_files,
        traces,
    }))
}

/// GET /trace/{id}
///
/// Streams the archive for a job as `application/zip`. `id` may be a job
/// id or a trace label as listed by `/traces`.
pub async fn download_trace(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Trace",
            id: id.clone(),
        })
    };

    // Ids end up in a file path.
    if columbia_core::quote_input::validate_job_id(&id).is_err() {
        return Err(not_found());
    }

    let label = state.dispatcher.status(&id).await.map(|r| r.trace_label);
    let dir = state.trace_dir.as_ref().clone();
    let lookup_id = id.clone();
    let path = tokio::task::spawn_blocking(move || {
        artifacts::find_trace(&dir, &lookup_id, label.as_deref())
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?
    .ok_or_else(not_found)?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        AppError::InternalError(format!("Failed to read {}: {e}", path.display()))
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{id}.zip"));

    tracing::info!(trace_id = %id, path = %path.display(), "Serving trace archive");

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Body::from(bytes),
    )
        .into_response())
}
