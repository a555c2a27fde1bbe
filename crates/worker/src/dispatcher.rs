//! Job dispatcher.
//!
//! Runs `worker_count` long-lived Tokio tasks. Each one loops:
//!
//! 1. wait for the head of the [`TaskQueue`],
//! 2. take a slot from the [`SlotPool`] (waiting in place if none is free),
//! 3. mark the job `running` and invoke the [`SubmissionProcedure`],
//! 4. mark it `completed` or `failed`,
//! 5. release the slot.
//!
//! Steps 1 and 2 run behind a turnstile so jobs start in strict queue order.
//! The procedure runs in its own task so a panic is recorded as a failure
//! and never takes the worker down. Failures are not retried.
//!
//! Every queue entry is submitted, including entries for an id that was
//! reused while they waited. Such an entry no longer owns the record, so its
//! run leaves the record to the newer submission.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use columbia_core::error::CoreError;
use columbia_core::job::JobRecord;
use columbia_core::naming;
use columbia_core::quote_input::{self, QuoteInput};
use columbia_core::submission::{SubmissionContext, SubmissionError, SubmissionProcedure};
use serde::Serialize;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::config::DispatcherConfig;
use crate::queue::{QueuedJob, TaskQueue};
use crate::registry::JobRegistry;
use crate::slots::{SlotGuard, SlotPool};

/// Point-in-time counters for health and diagnostics endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    /// Slots currently held (submissions in flight).
    pub active_workers: usize,
    /// Slot capacity.
    pub max_workers: usize,
    /// Jobs waiting in the queue.
    pub queue_size: usize,
    /// Whether the exclusive browser session is in use.
    pub browser_in_use: bool,
}

/// State shared between the dispatcher handle and its worker tasks.
struct Shared {
    queue: TaskQueue,
    /// Serializes the dequeue-then-wait-for-slot step across workers.
    turnstile: tokio::sync::Mutex<()>,
    slots: SlotPool,
    registry: JobRegistry,
    procedure: Arc<dyn SubmissionProcedure>,
}

/// Owns the queue, slot pool, registry and worker tasks.
///
/// Created once at startup via [`Dispatcher::start`]; the returned `Arc` is
/// cloned into request handlers.
pub struct Dispatcher {
    shared: Arc<Shared>,
    max_queue_depth: usize,
    next_submission: AtomicU64,
    cancel: CancellationToken,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Build the engine and spawn its worker tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: &DispatcherConfig, procedure: Arc<dyn SubmissionProcedure>) -> Arc<Self> {
        let config = config.clone().sanitized();
        let shared = Arc::new(Shared {
            queue: TaskQueue::new(),
            turnstile: tokio::sync::Mutex::new(()),
            slots: SlotPool::new(config.max_workers),
            registry: JobRegistry::new(config.registry_capacity),
            procedure,
        });
        let cancel = CancellationToken::new();

        let workers = (1..=config.worker_count)
            .map(|worker| {
                let shared = Arc::clone(&shared);
                let cancel = cancel.clone();
                tokio::spawn(async move { worker_loop(worker, shared, cancel).await })
            })
            .collect();

        tracing::info!(
            max_workers = config.max_workers,
            worker_count = config.worker_count,
            registry_capacity = config.registry_capacity,
            max_queue_depth = config.max_queue_depth,
            "Dispatcher started",
        );

        Arc::new(Self {
            shared,
            max_queue_depth: config.max_queue_depth,
            next_submission: AtomicU64::new(1),
            cancel,
            workers: tokio::sync::Mutex::new(workers),
        })
    }

    /// Accept a job: create exactly one queued record and one queue entry.
    ///
    /// `job_id` is validated when supplied and generated otherwise. Reusing an
    /// id is not rejected: it adds a second queue entry and the new record
    /// overwrites the old one.
    pub async fn submit(
        &self,
        job_id: Option<String>,
        input: QuoteInput,
    ) -> Result<JobRecord, CoreError> {
        let job_id = match job_id {
            Some(id) => {
                quote_input::validate_job_id(&id)?;
                id
            }
            None => naming::generate_job_id(chrono::Utc::now()),
        };

        let queue_size = self.shared.queue.len();
        if self.max_queue_depth > 0 && queue_size >= self.max_queue_depth {
            tracing::warn!(
                job_id = %job_id,
                queue_size,
                max_queue_depth = self.max_queue_depth,
                "Queue full; submission refused",
            );
            return Err(CoreError::Unavailable(format!(
                "Queue is full ({queue_size} jobs waiting); try again later"
            )));
        }

        let slots = &self.shared.slots;
        let all_busy = slots.held() >= slots.capacity();
        let queue_position = if all_busy || queue_size > 0 {
            queue_size + 1
        } else {
            0
        };

        let submission = self.next_submission.fetch_add(1, Ordering::Relaxed);
        let trace_label = naming::trace_label(input.company_name(), &job_id);
        let record = JobRecord::queued(
            job_id.clone(),
            input.clone(),
            queue_position,
            trace_label.clone(),
        )
        .with_submission(submission);

        self.shared.registry.put(record.clone()).await;
        self.shared.queue.enqueue(QueuedJob {
            job_id: job_id.clone(),
            input,
            trace_label,
            submission,
        });

        if queue_position > 0 {
            tracing::info!(job_id = %job_id, queue_position, "Job queued");
        } else {
            tracing::info!(job_id = %job_id, "Job will start immediately");
        }

        Ok(record)
    }

    /// Current record for `job_id`, if known.
    pub async fn status(&self, job_id: &str) -> Option<JobRecord> {
        self.shared.registry.get(job_id).await
    }

    /// Every record in the registry, oldest first.
    pub async fn list_jobs(&self) -> Vec<JobRecord> {
        self.shared.registry.list_all().await
    }

    pub fn stats(&self) -> DispatcherStats {
        let held = self.shared.slots.held();
        DispatcherStats {
            active_workers: held,
            max_workers: self.shared.slots.capacity(),
            queue_size: self.shared.queue.len(),
            browser_in_use: held > 0,
        }
    }

    /// Highest number of concurrently held slots since startup.
    pub fn peak_active(&self) -> usize {
        self.shared.slots.peak()
    }

    /// Stop all workers.
    ///
    /// Idle workers exit at once. Workers in the middle of a submission are
    /// given up to `timeout` to finish; the procedure itself is never
    /// interrupted.
    pub async fn shutdown(&self, timeout: Duration) {
        tracing::info!("Shutting down dispatcher");
        self.cancel.cancel();
        self.shared.slots.close();

        let handles: Vec<_> = self.workers.lock().await.drain(..).collect();
        let joined = tokio::time::timeout(timeout, async {
            for handle in handles {
                let _ = handle.await;
            }
        })
        .await;

        if joined.is_err() {
            tracing::warn!(
                timeout_secs = timeout.as_secs(),
                "Dispatcher workers still busy after shutdown timeout",
            );
        }

        let left = self.shared.queue.len();
        if left > 0 {
            tracing::warn!(queue_size = left, "Jobs left queued at shutdown");
        }
        tracing::info!("Dispatcher shut down complete");
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

async fn worker_loop(worker: usize, shared: Arc<Shared>, cancel: CancellationToken) {
    tracing::info!(worker, "Worker started");

    loop {
        let claimed = {
            let _turn = tokio::select! {
                _ = cancel.cancelled() => break,
                turn = shared.turnstile.lock() => turn,
            };
            claim_next(worker, &shared, &cancel).await
        };

        match claimed {
            Some((job, slot)) => run_job(worker, &shared, job, slot).await,
            None => break,
        }
    }

    tracing::info!(worker, "Worker stopped");
}

/// Take the queue head and a slot for it.
///
/// Called with the turnstile held, so only one worker at a time sits between
/// dequeuing and starting; jobs therefore start in queue order even when
/// several workers are idle. Returns `None` on shutdown, putting a job that
/// was already dequeued back at the head.
async fn claim_next(
    worker: usize,
    shared: &Shared,
    cancel: &CancellationToken,
) -> Option<(QueuedJob, SlotGuard)> {
    let job = shared.queue.dequeue(cancel).await?;

    if let Some(slot) = shared.slots.try_acquire() {
        return Some((job, slot));
    }

    tracing::debug!(worker, job_id = %job.job_id, "All slots busy; waiting in place");
    let waited = tokio::select! {
        _ = cancel.cancelled() => None,
        slot = shared.slots.acquire() => slot,
    };

    match waited {
        Some(slot) => Some((job, slot)),
        None => {
            tracing::info!(worker, job_id = %job.job_id, "Shutdown while waiting for a slot; job returned to queue");
            shared.queue.push_front(job);
            None
        }
    }
}

/// Run one job while holding `slot`. The slot is released when this returns.
async fn run_job(worker: usize, shared: &Shared, job: QueuedJob, slot: SlotGuard) {
    let job_id = job.job_id.clone();
    let submission = job.submission;

    let owns_record = match shared
        .registry
        .update_submission(&job_id, submission, JobRecord::mark_running)
        .await
    {
        Ok(Some(_)) => true,
        Ok(None) => {
            tracing::warn!(
                worker,
                job_id = %job_id,
                submission,
                "Job id was resubmitted; running this entry without updating its record",
            );
            false
        }
        Err(e) => {
            tracing::error!(worker, job_id = %job_id, error = %e, "Could not mark job running");
            false
        }
    };

    tracing::info!(
        worker,
        job_id = %job_id,
        active = shared.slots.held(),
        max = shared.slots.capacity(),
        "Processing job",
    );

    let ctx = SubmissionContext {
        job_id: job.job_id,
        input: job.input,
        trace_label: job.trace_label,
    };
    let procedure = Arc::clone(&shared.procedure);
    let outcome = match tokio::spawn(async move { procedure.submit(&ctx).await }).await {
        Ok(result) => result,
        Err(e) => Err(SubmissionError::Panicked(join_error_message(e))),
    };

    match &outcome {
        Ok(()) => tracing::info!(worker, job_id = %job_id, "Submission completed"),
        Err(e) => tracing::error!(worker, job_id = %job_id, error = %e, "Submission failed"),
    }

    if owns_record {
        let update = match outcome {
            Ok(()) => {
                shared
                    .registry
                    .update_submission(&job_id, submission, JobRecord::mark_completed)
                    .await
            }
            Err(e) => {
                let message = e.to_string();
                shared
                    .registry
                    .update_submission(&job_id, submission, |r| r.mark_failed(message))
                    .await
            }
        };

        match update {
            Ok(Some(_)) => {}
            Ok(None) => tracing::warn!(
                worker,
                job_id = %job_id,
                submission,
                "Job id was resubmitted while running; outcome not recorded",
            ),
            Err(e) => {
                tracing::error!(worker, job_id = %job_id, error = %e, "Could not record job outcome")
            }
        }
    }

    drop(slot);
    tracing::info!(
        worker,
        job_id = %job_id,
        active = shared.slots.held(),
        "Worker slot released",
    );
}

/// Extract a readable message from a failed procedure task.
fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "submission task was cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
