use std::path::PathBuf;
use std::sync::Arc;

use columbia_worker::Dispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or is `Copy`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Job queue, slot pool and registry.
    pub dispatcher: Arc<Dispatcher>,
    /// Directory holding trace archives.
    pub trace_dir: Arc<PathBuf>,
    /// How many trace archives the retention sweep keeps.
    pub max_trace_files: usize,
}
