// crates/jobs/src/job.rs
//! A single controllable background job.

use std::sync::{Arc, Mutex, MutexGuard};

use pipeline_core::RecordSource;
use tokio::sync::broadcast;

use super::control::{self, Controls, Handoff};
use super::processor::RecordProcessor;
use super::state::JobState;
use super::types::{JobId, JobSnapshot, JobStatus};
use super::worker::Worker;

/// One unit of record processing with its own worker and state machine.
///
/// ```text
/// NotStarted -> Running <-> Paused
///                  |          |
///                  v          v
///      Finished | GotError | Terminated
/// ```
///
/// `pause`, `resume` and `terminate` return only after the worker has taken
/// the signal, so they can take up to one record's processing time.
/// Control calls on the same job are serialized.
pub struct Job {
    state: JobState,
    worker: Mutex<Option<Worker>>,
    controls: Mutex<Option<Controls>>,
    control_lock: tokio::sync::Mutex<()>,
}

impl Job {
    pub fn new(
        id: impl Into<JobId>,
        source: impl RecordSource + 'static,
        processor: Arc<dyn RecordProcessor>,
    ) -> Arc<Self> {
        let (controls, checkpoints) = control::channels();
        let worker = Worker::new(Box::new(source), processor, checkpoints);
        Arc::new(Self {
            state: JobState::new(id.into()),
            worker: Mutex::new(Some(worker)),
            controls: Mutex::new(Some(controls)),
            control_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn id(&self) -> &str {
        self.state.id()
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.last_error()
    }

    pub fn processed(&self) -> u64 {
        self.state.processed()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobSnapshot> {
        self.state.subscribe()
    }

    /// Start the worker. Must be called from within a tokio runtime.
    ///
    /// Returns immediately. Only the first call on a `NotStarted` job spawns
    /// a worker; every other call is a no-op returning false.
    pub fn run(self: &Arc<Self>) -> bool {
        if !self
            .state
            .transition(&[JobStatus::NotStarted], JobStatus::Running)
        {
            return false;
        }
        let Some(worker) = lock(&self.worker).take() else {
            return false;
        };

        let job = Arc::clone(self);
        tokio::spawn(async move { worker.run(job).await });
        tracing::info!(job_id = %self.id(), "running");
        true
    }

    /// Pause a running job. No-op unless the job is `Running`.
    pub async fn pause(&self) -> bool {
        let _serial = self.control_lock.lock().await;
        if !self
            .state
            .transition(&[JobStatus::Running], JobStatus::Paused)
        {
            return false;
        }
        let delivered = self.hand_off(|c| &c.pause).await;
        if delivered {
            tracing::info!(job_id = %self.id(), "paused");
        }
        delivered
    }

    /// Resume a paused job. No-op unless the job is `Paused`.
    pub async fn resume(&self) -> bool {
        let _serial = self.control_lock.lock().await;
        if !self
            .state
            .transition(&[JobStatus::Paused], JobStatus::Running)
        {
            return false;
        }
        let delivered = self.hand_off(|c| &c.resume).await;
        if delivered {
            tracing::info!(job_id = %self.id(), "resumed");
        }
        delivered
    }

    /// Kill a running or paused job. No-op unless `Running` or `Paused`.
    pub async fn terminate(&self) -> bool {
        let _serial = self.control_lock.lock().await;
        if !self.state.transition(
            &[JobStatus::Running, JobStatus::Paused],
            JobStatus::Terminated,
        ) {
            return false;
        }
        // The status is already final; if the worker stopped on its own in
        // the meantime the handoff fails and there is nothing left to stop.
        self.hand_off(|c| &c.terminate).await;
        true
    }

    /// Drop the caller side of the control channels.
    ///
    /// Called by the worker on its way out. Only the first call releases
    /// anything; later calls return false.
    pub(crate) fn release(&self) -> bool {
        let released = lock(&self.controls).take().is_some();
        if released {
            tracing::debug!(job_id = %self.id(), "control channels released");
        }
        released
    }

    #[cfg(test)]
    pub(crate) fn is_released(&self) -> bool {
        lock(&self.controls).is_none()
    }

    pub(crate) fn state(&self) -> &JobState {
        &self.state
    }

    async fn hand_off(&self, pick: impl FnOnce(&Controls) -> &Handoff) -> bool {
        let handoff = match lock(&self.controls).as_ref() {
            Some(controls) => pick(controls).clone(),
            None => return false,
        };
        handoff.send().await
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id())
            .field("status", &self.status())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
