//! Per-run trace archive.
//!
//! A [`TraceRecorder`] collects timestamped step entries while the portal
//! flow runs, then writes `{trace_dir}/{label}.zip` containing `trace.json`
//! and, for failed runs, `error.txt`.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// One recorded step.
#[derive(Debug, Clone, Serialize)]
pub struct TraceStep {
    pub at: DateTime<Utc>,
    pub step: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct TraceDocument<'a> {
    label: &'a str,
    job_id: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    outcome: &'a str,
    steps: &'a [TraceStep],
}

/// Collects steps for a single submission run.
#[derive(Debug)]
pub struct TraceRecorder {
    label: String,
    job_id: String,
    started_at: DateTime<Utc>,
    steps: Vec<TraceStep>,
}

impl TraceRecorder {
    pub fn new(label: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            job_id: job_id.into(),
            started_at: Utc::now(),
            steps: Vec::new(),
        }
    }

    pub fn ok(&mut self, step: impl Into<String>) {
        self.push(step.into(), true, None);
    }

    pub fn failed(&mut self, step: impl Into<String>, detail: impl Into<String>) {
        self.push(step.into(), false, Some(detail.into()));
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Write the archive into `dir` and return its path.
    ///
    /// `error` is the run's failure message, if any.
    pub fn save(&self, dir: &Path, error: Option<&str>) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let document = TraceDocument {
            label: &self.label,
            job_id: &self.job_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            outcome: if error.is_some() { "failed" } else { "completed" },
            steps: &self.steps,
        };
        let json = serde_json::to_vec_pretty(&document).map_err(std::io::Error::other)?;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        writer.start_file("trace.json", options).map_err(std::io::Error::other)?;
        writer.write_all(&json)?;

        if let Some(error) = error {
            writer.start_file("error.txt", options).map_err(std::io::Error::other)?;
            writer.write_all(error.as_bytes())?;
        }

        let bytes = writer.finish().map_err(std::io::Error::other)?.into_inner();
        let path = dir.join(format!("{}.zip", self.label));
        std::fs::write(&path, &bytes)?;

        tracing::info!(
            job_id = %self.job_id,
            path = %path.display(),
            size = bytes.len(),
            "Trace archive saved",
        );
        Ok(path)
    }

    fn push(&mut self, step: String, ok: bool, detail: Option<String>) {
        self.steps.push(TraceStep {
            at: Utc::now(),
            step,
            ok,
            detail,
        });
    }
}
