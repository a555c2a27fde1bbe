//! Execution slot pool.
//!
//! Bounds how many submission procedures run at once. The portal session
//! is exclusive, so in practice the pool has a single slot. A slot is held
//! through a [`SlotGuard`]; dropping the guard releases it, so every exit
//! path (success, failure, panic unwinding) gives the slot back exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Semaphore-backed pool of execution slots.
#[derive(Debug)]
pub struct SlotPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    held: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// Proof of holding one slot. Released on drop.
#[derive(Debug)]
pub struct SlotGuard {
    held: Arc<AtomicUsize>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // Runs before `_permit` is dropped, so `held` never overshoots
        // capacity while the permit is handed to the next waiter.
        self.held.fetch_sub(1, Ordering::AcqRel);
    }
}

impl SlotPool {
    /// Create a pool with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "slot capacity must be > 0");

        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            held: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Take a slot if one is free right now.
    pub fn try_acquire(&self) -> Option<SlotGuard> {
        let permit = Arc::clone(&self.semaphore).try_acquire_owned().ok()?;
        Some(self.guard(permit))
    }

    /// Wait for a slot. Waiters are served in arrival order.
    ///
    /// Returns `None` if the pool has been closed.
    pub async fn acquire(&self) -> Option<SlotGuard> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok()?;
        Some(self.guard(permit))
    }

    /// Refuse all further acquisitions and wake every waiter with `None`.
    ///
    /// Slots already held stay valid until their guards drop.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Number of slots currently held.
    pub fn held(&self) -> usize {
        self.held.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Highest number of slots ever held at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    fn guard(&self, permit: OwnedSemaphorePermit) -> SlotGuard {
        let now = self.held.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        SlotGuard {
            held: Arc::clone(&self.held),
            _permit: permit,
        }
    }
}
