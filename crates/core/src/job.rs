//! Job record and lifecycle state machine.
//!
//! A job moves strictly forward: `queued -> running -> {completed, failed}`.
//! Every transition goes through [`JobRecord`]'s `mark_*` methods, which
//! reject anything the state machine does not allow so a terminal record
//! can never be reopened.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::quote_input::QuoteInput;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a submission job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Wire name of the status (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::JobStatus;

    /// Returns the set of statuses reachable from `from`.
    pub fn valid_transitions(from: JobStatus) -> &'static [JobStatus] {
        match from {
            JobStatus::Queued => &[JobStatus::Running],
            JobStatus::Running => &[JobStatus::Completed, JobStatus::Failed],
            JobStatus::Completed | JobStatus::Failed => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning an error message for invalid ones.
    pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!("Invalid job transition: {from} -> {to}"))
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Snapshot of one job's identity, input and lifecycle.
///
/// `queue_position` is advisory: it is computed once at enqueue time and is
/// never refreshed as the queue drains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub input: QuoteInput,
    pub queue_position: usize,
    /// File stem of the trace archive written for this job.
    pub trace_label: String,
    pub queued_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Sequence number of the submission that owns this record. A reused id
    /// gets a new number, so updates from an older queue entry can be told
    /// apart from the current one.
    #[serde(skip)]
    pub submission: u64,
}

impl JobRecord {
    /// Create a freshly queued record.
    pub fn queued(
        id: JobId,
        input: QuoteInput,
        queue_position: usize,
        trace_label: String,
    ) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            input,
            queue_position,
            trace_label,
            queued_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            error: None,
            submission: 0,
        }
    }

    /// Tag the record with the submission that created it.
    pub fn with_submission(mut self, submission: u64) -> Self {
        self.submission = submission;
        self
    }

    /// `queued -> running`, stamping `started_at`.
    pub fn mark_running(&mut self) -> Result<(), CoreError> {
        self.transition(JobStatus::Running)?;
        self.started_at = Some(chrono::Utc::now());
        Ok(())
    }

    /// `running -> completed`, stamping `completed_at`.
    pub fn mark_completed(&mut self) -> Result<(), CoreError> {
        self.transition(JobStatus::Completed)?;
        self.completed_at = Some(chrono::Utc::now());
        Ok(())
    }

    /// `running -> failed`, recording the error and stamping `failed_at`.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), CoreError> {
        self.transition(JobStatus::Failed)?;
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "Submission failed without an error message".to_string();
        }
        self.error = Some(error);
        self.failed_at = Some(chrono::Utc::now());
        Ok(())
    }

    fn transition(&mut self, to: JobStatus) -> Result<(), CoreError> {
        state_machine::validate_transition(self.status, to).map_err(|msg| {
            CoreError::Conflict(format!("{msg} (job {})", self.id))
        })?;
        self.status = to;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
