//! Filesystem helpers for trace archives.
//!
//! Blocking `std::fs` calls; async callers go through
//! `tokio::task::spawn_blocking`.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One `*.zip` file in the trace directory.
#[derive(Debug, Clone, Serialize)]
pub struct TraceFile {
    /// File stem, i.e. the trace label.
    pub label: String,
    pub filename: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
    /// Download path for this archive.
    pub url: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// Every trace archive in `dir`, newest first.
///
/// A missing directory yields an empty list. Entries whose metadata cannot
/// be read are skipped.
pub fn trace_archives(dir: &Path) -> std::io::Result<Vec<TraceFile>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files: Vec<TraceFile> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("zip") {
                return None;
            }
            let meta = match entry.metadata() {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => return None,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable trace file");
                    return None;
                }
            };
            let label = path.file_stem()?.to_string_lossy().into_owned();
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some(TraceFile {
                filename: format!("{label}.zip"),
                url: format!("/trace/{label}"),
                label,
                size_bytes: meta.len(),
                modified_at: DateTime::<Utc>::from(modified),
                path,
            })
        })
        .collect();

    files.sort_by(|a, b| b.modified_at.cmp(&a.modified_at).then_with(|| a.label.cmp(&b.label)));
    Ok(files)
}

/// Locate the archive for a job.
///
/// Tries, in order: the recorded trace label, the job id itself, then any
/// archive whose label ends with `_{job_id}`.
pub fn find_trace(dir: &Path, job_id: &str, trace_label: Option<&str>) -> Option<PathBuf> {
    let direct = trace_label
        .into_iter()
        .chain(std::iter::once(job_id))
        .map(|stem| dir.join(format!("{stem}.zip")))
        .find(|p| p.is_file());
    if direct.is_some() {
        return direct;
    }

    let suffix = format!("_{job_id}");
    trace_archives(dir)
        .ok()?
        .into_iter()
        .find(|f| f.label.ends_with(&suffix))
        .map(|f| f.path)
}
