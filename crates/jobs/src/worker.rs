// crates/jobs/src/worker.rs
//! The record loop that runs on a job's tokio task.

use std::sync::Arc;

use pipeline_core::RecordSource;

use super::control::{Checkpoints, Signal};
use super::job::Job;
use super::processor::RecordProcessor;
use super::types::JobStatus;

/// States from which the worker may end a job on its own.
const LIVE: [JobStatus; 2] = [JobStatus::Running, JobStatus::Paused];

enum Parked {
    Resume(Option<Signal>),
    Terminate(Option<Signal>),
}

pub(crate) struct Worker {
    source: Box<dyn RecordSource>,
    processor: Arc<dyn RecordProcessor>,
    checkpoints: Checkpoints,
}

impl Worker {
    pub(crate) fn new(
        source: Box<dyn RecordSource>,
        processor: Arc<dyn RecordProcessor>,
        checkpoints: Checkpoints,
    ) -> Self {
        Self {
            source,
            processor,
            checkpoints,
        }
    }

    pub(crate) async fn run(mut self, job: Arc<Job>) {
        loop {
            // Terminate is checked before pause.
            if let Some(signal) = self.checkpoints.terminate.poll() {
                stop_terminated(&job, Some(signal));
                return;
            }

            if let Some(signal) = self.checkpoints.pause.poll() {
                signal.ack();
                tracing::debug!(job_id = %job.id(), "worker parked");

                let parked = tokio::select! {
                    biased;
                    signal = self.checkpoints.terminate.wait() => Parked::Terminate(signal),
                    signal = self.checkpoints.resume.wait() => Parked::Resume(signal),
                };
                match parked {
                    Parked::Resume(Some(signal)) => {
                        signal.ack();
                        continue;
                    }
                    Parked::Terminate(Some(signal)) => {
                        stop_terminated(&job, Some(signal));
                        return;
                    }
                    Parked::Resume(None) | Parked::Terminate(None) => {
                        stop_orphaned(&job);
                        return;
                    }
                }
            }

            match self.source.next_record().await {
                Ok(Some(record)) => {
                    self.processor.process(job.id(), &record).await;
                    job.state().record_processed();
                }
                Ok(None) => {
                    if job.state().transition(&LIVE, JobStatus::Finished) {
                        tracing::info!(
                            job_id = %job.id(),
                            processed = job.processed(),
                            "finished"
                        );
                    }
                    job.release();
                    return;
                }
                Err(e) => {
                    if job.state().fail(&LIVE, e.to_string()) {
                        tracing::warn!(job_id = %job.id(), error = %e, "got error");
                    }
                    job.release();
                    return;
                }
            }
        }
    }
}

/// The terminate call has already set the status; release before the
/// acknowledgement so the caller observes a fully stopped job.
fn stop_terminated(job: &Job, signal: Option<Signal>) {
    job.release();
    tracing::info!(job_id = %job.id(), processed = job.processed(), "terminated");
    if let Some(signal) = signal {
        signal.ack();
    }
}

/// The control channels closed while parked, so no resume can ever arrive.
fn stop_orphaned(job: &Job) {
    if job.state().transition(&LIVE, JobStatus::Terminated) {
        tracing::warn!(
            job_id = %job.id(),
            processed = job.processed(),
            "control channels closed while paused; terminated"
        );
    }
    job.release();
}
