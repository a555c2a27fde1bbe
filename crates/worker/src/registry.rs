//! In-memory job registry.
//!
//! Maps job ids to their latest [`JobRecord`]. Nothing is persisted; the
//! registry lives for the process lifetime. Retention is bounded: once the
//! registry holds more than `capacity` records, the oldest terminal records
//! are evicted. Queued and running records are never evicted.

use columbia_core::error::CoreError;
use columbia_core::job::JobRecord;
use indexmap::IndexMap;
use tokio::sync::RwLock;

/// Process-wide map from job id to job record, in insertion order.
pub struct JobRegistry {
    records: RwLock<IndexMap<String, JobRecord>>,
    capacity: usize,
}

impl JobRegistry {
    /// Create a registry that keeps at most `capacity` records (`0` = unbounded).
    pub fn new(capacity: usize) -> Self {
        Self {
            records: RwLock::new(IndexMap::new()),
            capacity,
        }
    }

    /// Insert or overwrite a record. The last writer wins.
    pub async fn put(&self, record: JobRecord) {
        let mut records = self.records.write().await;
        if let Some(previous) = records.insert(record.id.clone(), record) {
            tracing::warn!(
                job_id = %previous.id,
                previous_status = %previous.status,
                "Job id reused; previous record overwritten",
            );
        }
        self.evict(&mut records);
    }

    /// Snapshot of a single record.
    pub async fn get(&self, id: &str) -> Option<JobRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Snapshot of every record, oldest first.
    pub async fn list_all(&self) -> Vec<JobRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Apply `f` to the record under the write lock and return the updated snapshot.
    ///
    /// Returns `NotFound` if the id is unknown, or whatever error `f` returns
    /// (the record is left untouched in that case).
    pub async fn update<F>(&self, id: &str, f: F) -> Result<JobRecord, CoreError>
    where
        F: FnOnce(&mut JobRecord) -> Result<(), CoreError>,
    {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| CoreError::NotFound {
            entity: "Job",
            id: id.to_string(),
        })?;

        let mut next = record.clone();
        f(&mut next)?;
        *record = next.clone();
        Ok(next)
    }

    /// Like [`update`](Self::update), but only while the record still belongs
    /// to `submission`.
    ///
    /// Returns `Ok(None)` when the id has since been resubmitted and the record
    /// now tracks a newer submission; the record is left untouched.
    pub async fn update_submission<F>(
        &self,
        id: &str,
        submission: u64,
        f: F,
    ) -> Result<Option<JobRecord>, CoreError>
    where
        F: FnOnce(&mut JobRecord) -> Result<(), CoreError>,
    {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| CoreError::NotFound {
            entity: "Job",
            id: id.to_string(),
        })?;
        if record.submission != submission {
            return Ok(None);
        }

        let mut next = record.clone();
        f(&mut next)?;
        *record = next.clone();
        Ok(Some(next))
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn evict(&self, records: &mut IndexMap<String, JobRecord>) {
        if self.capacity == 0 || records.len() <= self.capacity {
            return;
        }

        let excess = records.len() - self.capacity;
        let victims: Vec<String> = records
            .values()
            .filter(|r| r.status.is_terminal())
            .take(excess)
            .map(|r| r.id.clone())
            .collect();

        for id in &victims {
            records.shift_remove(id);
        }

        if victims.len() < excess {
            tracing::warn!(
                capacity = self.capacity,
                len = records.len(),
                "Job registry over capacity with no terminal records left to evict",
            );
        } else {
            tracing::debug!(evicted = victims.len(), "Evicted terminal job records");
        }
    }
}
