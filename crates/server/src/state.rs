// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use pipeline_jobs::{JobRegistry, RecordProcessor, SimulatedLatency};

use crate::config::Config;
use crate::storage::UploadStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Every job created by this process, by id.
    pub registry: Arc<JobRegistry>,
    /// Where uploaded files are written before a job reads them.
    pub uploads: UploadStore,
    /// Per-record work shared by all jobs.
    pub processor: Arc<dyn RecordProcessor>,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(config: &Config) -> Arc<Self> {
        Self::with_parts(
            UploadStore::new(&config.upload_dir),
            Arc::new(SimulatedLatency::new(config.max_record_delay())),
            config.max_upload_bytes,
        )
    }

    /// Create with an explicit store and processor (tests, embedding).
    pub fn with_parts(
        uploads: UploadStore,
        processor: Arc<dyn RecordProcessor>,
        max_upload_bytes: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            registry: Arc::new(JobRegistry::new()),
            uploads,
            processor,
            max_upload_bytes,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
