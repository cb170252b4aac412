// crates/jobs/src/state.rs
//! Guarded state for a single job.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::types::{JobId, JobSnapshot, JobStatus};

struct Inner {
    status: JobStatus,
    last_error: Option<String>,
    processed: u64,
    updated_at: DateTime<Utc>,
}

/// Status, error and progress of one job behind a single mutex.
///
/// Every change is published as a [`JobSnapshot`] to subscribers. Sending
/// with no subscribers is fine.
pub struct JobState {
    id: JobId,
    created_at: DateTime<Utc>,
    inner: Mutex<Inner>,
    events_tx: broadcast::Sender<JobSnapshot>,
}

impl JobState {
    pub fn new(id: JobId) -> Self {
        let (events_tx, _) = broadcast::channel(64);
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            inner: Mutex::new(Inner {
                status: JobStatus::NotStarted,
                last_error: None,
                processed: 0,
                updated_at: now,
            }),
            events_tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.lock().status
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn processed(&self) -> u64 {
        self.lock().processed
    }

    /// Move to `to` if the current status is one of `from`.
    ///
    /// Returns false (and changes nothing) otherwise. Terminal statuses never
    /// appear in a `from` list, which keeps them final.
    pub fn transition(&self, from: &[JobStatus], to: JobStatus) -> bool {
        let snapshot = {
            let mut inner = self.lock();
            if !from.contains(&inner.status) {
                return false;
            }
            inner.status = to;
            inner.updated_at = Utc::now();
            self.snapshot_of(&inner)
        };
        let _ = self.events_tx.send(snapshot);
        true
    }

    /// Move to `GotError` from `from`, recording the error in the same step.
    pub fn fail(&self, from: &[JobStatus], error: impl Into<String>) -> bool {
        let snapshot = {
            let mut inner = self.lock();
            if !from.contains(&inner.status) {
                return false;
            }
            inner.status = JobStatus::GotError;
            inner.last_error = Some(error.into());
            inner.updated_at = Utc::now();
            self.snapshot_of(&inner)
        };
        let _ = self.events_tx.send(snapshot);
        true
    }

    /// Count one processed record and return the new total.
    pub fn record_processed(&self) -> u64 {
        let snapshot = {
            let mut inner = self.lock();
            inner.processed += 1;
            inner.updated_at = Utc::now();
            self.snapshot_of(&inner)
        };
        let processed = snapshot.processed;
        let _ = self.events_tx.send(snapshot);
        processed
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobSnapshot> {
        self.events_tx.subscribe()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let inner = self.lock();
        self.snapshot_of(&inner)
    }

    fn snapshot_of(&self, inner: &Inner) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            status: inner.status,
            processed: inner.processed,
            error: inner.last_error.clone(),
            created_at: self.created_at,
            updated_at: inner.updated_at,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!(job_id = %self.id, "job state mutex poisoned");
                poisoned.into_inner()
            }
        }
    }
}
