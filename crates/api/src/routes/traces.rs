use axum::routing::get;
use axum::Router;

use crate::handlers::traces;
use crate::state::AppState;

/// ```text
/// GET    /traces        -> list_traces
/// GET    /trace/{id}    -> download_trace
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/traces", get(traces::list_traces))
        .route("/trace/{id}", get(traces::download_trace))
}
