// crates/jobs/src/registry.rs
//! Process-wide lookup table for jobs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use super::job::Job;
use super::types::{JobSnapshot, RegistryError};

/// Registry of every job created by this process.
///
/// Entries are never removed. Snapshots of every registered job are also
/// forwarded to one registry-wide broadcast channel for streaming.
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Arc<Job>>>,
    events_tx: broadcast::Sender<JobSnapshot>,
}

impl JobRegistry {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            jobs: RwLock::new(HashMap::new()),
            events_tx,
        }
    }

    /// Register a job under its id. Existing entries are never overwritten.
    pub fn insert(&self, job: Arc<Job>) -> Result<(), RegistryError> {
        let id = job.id().to_string();
        {
            let mut jobs = self.write();
            if jobs.contains_key(&id) {
                return Err(RegistryError::DuplicateId(id));
            }
            jobs.insert(id.clone(), Arc::clone(&job));
        }

        // Forward job events to the registry channel while the job is live.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let events_tx = self.events_tx.clone();
            let mut rx = job.subscribe();
            handle.spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(snapshot) => {
                            let done = snapshot.status.is_terminal();
                            let _ = events_tx.send(snapshot);
                            if done {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(job_id = %id, skipped, "job event forwarder lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<Job>> {
        self.read().get(id).cloned()
    }

    /// Snapshots of every registered job, oldest first.
    pub fn snapshots(&self) -> Vec<JobSnapshot> {
        let mut all: Vec<JobSnapshot> = self
            .read()
            .values()
            .map(|job| job.snapshot())
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Snapshots of jobs that have not reached a terminal status.
    pub fn active(&self) -> Vec<JobSnapshot> {
        self.snapshots()
            .into_iter()
            .filter(|s| !s.status.is_terminal())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to snapshots of all registered jobs (for SSE streaming).
    pub fn subscribe(&self) -> broadcast::Receiver<JobSnapshot> {
        self.events_tx.subscribe()
    }

    // Every write is a single insert, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Job>>> {
        self.jobs.read().unwrap_or_else(|e| {
            tracing::error!("RwLock poisoned reading jobs map: {e}");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Job>>> {
        self.jobs.write().unwrap_or_else(|e| {
            tracing::error!("RwLock poisoned writing jobs map: {e}");
            e.into_inner()
        })
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
