//! Unbounded FIFO task queue with native suspension.
//!
//! Workers block in [`TaskQueue::dequeue`] on a [`Notify`] rather than
//! polling, and wake immediately when a job is enqueued or the shutdown
//! token fires.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use columbia_core::quote_input::QuoteInput;
use columbia_core::types::JobId;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// One pending submission.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job_id: JobId,
    pub input: QuoteInput,
    pub trace_label: String,
    /// Matches [`JobRecord::submission`](columbia_core::job::JobRecord::submission)
    /// of the record created alongside this entry.
    pub submission: u64,
}

/// Ordered buffer of jobs awaiting a free execution slot.
///
/// No priority and no deduplication: enqueuing the same id twice yields two
/// entries.
pub struct TaskQueue {
    items: Mutex<VecDeque<QueuedJob>>,
    notify: Notify,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Append a job to the tail. Never blocks, never rejects.
    pub fn enqueue(&self, job: QueuedJob) {
        self.lock().push_back(job);
        self.notify.notify_one();
    }

    /// Put a job back at the head, ahead of everything else.
    ///
    /// Used when a worker is shut down while holding a dequeued job so the
    /// job keeps its place.
    pub fn push_front(&self, job: QueuedJob) {
        self.lock().push_front(job);
        self.notify.notify_one();
    }

    /// Remove and return the head without waiting.
    pub fn try_dequeue(&self) -> Option<QueuedJob> {
        self.lock().pop_front()
    }

    /// Remove and return the head, suspending until one is available.
    ///
    /// Returns `None` once `cancel` is triggered.
    pub async fn dequeue(&self, cancel: &CancellationToken) -> Option<QueuedJob> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            if let Some(job) = self.try_dequeue() {
                return Some(job);
            }
            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = self.notify.notified() => {}
            }
        }
    }

    /// Current queue depth.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedJob>> {
        // No critical section here can panic, so a poisoned lock still
        // holds a consistent queue.
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
