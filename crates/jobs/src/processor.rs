// crates/jobs/src/processor.rs
//! Per-record work performed by a job's worker.

use std::time::Duration;

use async_trait::async_trait;
use pipeline_core::Record;
use rand::Rng;

/// Default upper bound for [`SimulatedLatency`].
pub const DEFAULT_MAX_RECORD_DELAY: Duration = Duration::from_millis(1000);

/// Processes one record at a time.
///
/// Implementations must finish in bounded time: the worker only answers
/// pause/resume/terminate between records.
#[async_trait]
pub trait RecordProcessor: Send + Sync {
    async fn process(&self, job_id: &str, record: &Record);
}

/// Stand-in for real work: sleeps a random duration below `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedLatency {
    max_delay: Duration,
}

impl SimulatedLatency {
    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    fn pick_delay(&self) -> Duration {
        let max_nanos = u64::try_from(self.max_delay.as_nanos()).unwrap_or(u64::MAX);
        if max_nanos == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::thread_rng().gen_range(0..max_nanos))
    }
}

impl Default for SimulatedLatency {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORD_DELAY)
    }
}

#[async_trait]
impl RecordProcessor for SimulatedLatency {
    async fn process(&self, job_id: &str, record: &Record) {
        let delay = self.pick_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        tracing::debug!(
            job_id = %job_id,
            fields = record.len(),
            delay_ms = delay.as_millis() as u64,
            "processed record"
        );
    }
}
