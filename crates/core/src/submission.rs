//! Submission procedure interface.
//!
//! Defines [`SubmissionProcedure`], the seam between the dispatcher and
//! whatever actually drives the carrier portal, along with
//! [`SubmissionContext`] and [`SubmissionError`].

use async_trait::async_trait;

use crate::quote_input::QuoteInput;
use crate::types::JobId;

/// Everything a procedure needs to run one job.
#[derive(Debug, Clone)]
pub struct SubmissionContext {
    pub job_id: JobId,
    pub input: QuoteInput,
    /// File stem for any trace artifact the procedure writes.
    pub trace_label: String,
}

/// Why a submission did not complete.
///
/// The `Display` output becomes the job record's `error` field.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// The procedure ran but reported that the submission did not go through.
    #[error("Submission rejected: {0}")]
    Rejected(String),

    /// The portal driver failed (browser session, navigation, missing element).
    #[error("Portal error: {0}")]
    Portal(String),

    /// The procedure panicked; the message is the panic payload if it was a string.
    #[error("Submission procedure panicked: {0}")]
    Panicked(String),
}

/// The long-running, non-interruptible operation that submits one quote.
///
/// Implementations may take minutes. The dispatcher guarantees that at most
/// `MAX_WORKERS` calls are in flight at once and never retries a failure.
#[async_trait]
pub trait SubmissionProcedure: Send + Sync {
    async fn submit(&self, ctx: &SubmissionContext) -> Result<(), SubmissionError>;
}
