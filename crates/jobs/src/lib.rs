// crates/jobs/src/lib.rs
//! Background job system for record processing.
//!
//! Provides:
//! - `Job` - one worker over one record source, with pause/resume/terminate
//! - `JobRegistry` - process-wide id → job lookup and event fan-in
//! - `RecordProcessor` - per-record work, `SimulatedLatency` by default
//! - `JobSnapshot` - serializable view of a job for status and streaming

mod control;
pub mod job;
pub mod processor;
pub mod registry;
pub mod state;
pub mod types;
mod worker;

pub use job::Job;
pub use processor::{RecordProcessor, SimulatedLatency, DEFAULT_MAX_RECORD_DELAY};
pub use registry::JobRegistry;
pub use state::JobState;
pub use types::{JobId, JobSnapshot, JobStatus, RegistryError};
