//! Periodic cleanup of browser profiles, trace archives, logs and screenshots.
//!
//! Every `interval` the sweep:
//!
//! - removes `browser_data_*` directories under the session dir older than
//!   `max_age`, never touching `browser_data_default`;
//! - keeps only the newest `max_trace_files` trace archives;
//! - removes `*.log` files in the log dir older than `max_age`;
//! - removes screenshot directories under `{log_dir}/screenshots` older
//!   than `max_age`.
//!
//! Failures on single entries are logged at debug level and skipped.

use std::path::Path;
use std::time::{Duration, SystemTime};

use columbia_portal::config::DEFAULT_PROFILE_DIR;
use tokio_util::sync::CancellationToken;

use crate::artifacts;
use crate::config::RetentionConfig;

const PROFILE_PREFIX: &str = "browser_data_";

/// Counts of what one sweep removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub profiles: usize,
    pub traces: usize,
    pub logs: usize,
    pub screenshots: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.profiles + self.traces + self.logs + self.screenshots
    }
}

/// Run the retention loop until `cancel` is triggered.
///
/// The first sweep happens one `interval` after startup.
pub async fn run(config: RetentionConfig, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = config.interval.as_secs(),
        max_age_secs = config.max_age.as_secs(),
        max_trace_files = config.max_trace_files,
        "Artifact retention job started"
    );

    let start = tokio::time::Instant::now() + config.interval;
    let mut interval = tokio::time::interval_at(start, config.interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Artifact retention job stopping");
                break;
            }
            _ = interval.tick() => {
                let cfg = config.clone();
                match tokio::task::spawn_blocking(move || sweep(&cfg, SystemTime::now())).await {
                    Ok(report) if report.total() > 0 => {
                        tracing::info!(
                            profiles = report.profiles,
                            traces = report.traces,
                            logs = report.logs,
                            screenshots = report.screenshots,
                            "Artifact retention: removed old files"
                        );
                    }
                    Ok(_) => tracing::debug!("Artifact retention: nothing to remove"),
                    Err(e) => tracing::error!(error = %e, "Artifact retention: sweep failed"),
                }
            }
        }
    }
}

/// Run one sweep as of `now`.
pub fn sweep(config: &RetentionConfig, now: SystemTime) -> SweepReport {
    SweepReport {
        profiles: sweep_dirs(&config.session_dir, now, config.max_age, |name| {
            name.starts_with(PROFILE_PREFIX) && name != DEFAULT_PROFILE_DIR
        }),
        traces: prune_traces(&config.trace_dir, config.max_trace_files),
        logs: sweep_logs(&config.log_dir, now, config.max_age),
        screenshots: sweep_dirs(&config.log_dir.join("screenshots"), now, config.max_age, |_| true),
    }
}

/// Remove subdirectories of `dir` matching `select` and older than `max_age`.
fn sweep_dirs(
    dir: &Path,
    now: SystemTime,
    max_age: Duration,
    select: impl Fn(&str) -> bool,
) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if !path.is_dir() || !select(&name) || !is_older(&path, now, max_age) {
            continue;
        }
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Deleted old directory");
                removed += 1;
            }
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "Could not delete directory"),
        }
    }
    removed
}

fn sweep_logs(dir: &Path, now: SystemTime, max_age: Duration) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let is_log = path.extension().and_then(|e| e.to_str()) == Some("log");
        if !is_log || !path.is_file() || !is_older(&path, now, max_age) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "Could not delete log"),
        }
    }
    removed
}

/// Delete all but the newest `keep` trace archives.
fn prune_traces(dir: &Path, keep: usize) -> usize {
    let traces = match artifacts::trace_archives(dir) {
        Ok(traces) => traces,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Could not list trace archives");
            return 0;
        }
    };

    let mut removed = 0;
    for trace in traces.into_iter().skip(keep) {
        match std::fs::remove_file(&trace.path) {
            Ok(()) => {
                tracing::info!(file = %trace.filename, "Deleted old trace");
                removed += 1;
            }
            Err(e) => tracing::debug!(file = %trace.filename, error = %e, "Could not delete trace"),
        }
    }
    removed
}

fn is_older(path: &Path, now: SystemTime, max_age: Duration) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .is_some_and(|age| age > max_age)
}
