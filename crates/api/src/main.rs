use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use columbia_core::submission::SubmissionProcedure;
use columbia_portal::{ColumbiaPortal, PortalConfig};
use columbia_worker::{Dispatcher, DispatcherConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use columbia_api::background;
use columbia_api::config::{LogFormat, RetentionConfig, ServerConfig};
use columbia_api::router::build_app_router;
use columbia_api::state::AppState;

const DEFAULT_LOG_FILTER: &str =
    "columbia_api=debug,columbia_worker=debug,columbia_portal=info,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let portal_config = PortalConfig::from_env();
    let retention_config = RetentionConfig::from_env(&portal_config);
    let dispatcher_config = DispatcherConfig::from_env();

    for dir in [
        &portal_config.session_dir,
        &portal_config.trace_dir,
        &retention_config.log_dir,
    ] {
        std::fs::create_dir_all(dir)
            .unwrap_or_else(|e| panic!("Failed to create directory {}: {e}", dir.display()));
    }

    // --- Dispatcher ---
    let trace_dir = portal_config.trace_dir.clone();
    tracing::info!(
        webdriver_url = %portal_config.webdriver_url,
        headless = portal_config.headless,
        tracing_enabled = portal_config.enable_tracing,
        "Portal driver configured"
    );
    let procedure: Arc<dyn SubmissionProcedure> = Arc::new(ColumbiaPortal::new(portal_config));
    let dispatcher = Dispatcher::start(&dispatcher_config, procedure);

    // --- Artifact retention ---
    let retention_cancel = tokio_util::sync::CancellationToken::new();
    let max_trace_files = retention_config.max_trace_files;
    let retention_handle = tokio::spawn(background::artifact_retention::run(
        retention_config,
        retention_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        dispatcher: Arc::clone(&dispatcher),
        trace_dir: Arc::new(trace_dir),
        max_trace_files,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    retention_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("Artifact retention stopped");

    dispatcher
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
