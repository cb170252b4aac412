// crates/jobs/src/types.rs
//! Types for the background job system.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identifier of a job, assigned by whoever creates it.
pub type JobId = String;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    NotStarted,
    Running,
    Paused,
    Terminated,
    GotError,
    Finished,
}

impl JobStatus {
    /// Wire name, identical to the serde representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Terminated => "terminated",
            Self::GotError => "got-error",
            Self::Finished => "finished",
        }
    }

    /// Terminal statuses never change again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated | Self::GotError | Self::Finished)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a job, published on every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    pub processed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors returned by [`crate::JobRegistry`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Job already registered: {0}")]
    DuplicateId(JobId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let all = [
            (JobStatus::NotStarted, "not-started"),
            (JobStatus::Running, "running"),
            (JobStatus::Paused, "paused"),
            (JobStatus::Terminated, "terminated"),
            (JobStatus::GotError, "got-error"),
            (JobStatus::Finished, "finished"),
        ];
        for (status, name) in all {
            assert_eq!(status.as_str(), name);
            assert_eq!(status.to_string(), name);
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{name}\""));
            let parsed: JobStatus = serde_json::from_str(&format!("\"{name}\"")).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::NotStarted.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Paused.is_terminal());
        assert!(JobStatus::Terminated.is_terminal());
        assert!(JobStatus::GotError.is_terminal());
        assert!(JobStatus::Finished.is_terminal());
    }

    #[test]
    fn test_snapshot_serialize() {
        let at = DateTime::parse_from_rfc3339("2026-02-05T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let snapshot = JobSnapshot {
            id: "abc".to_string(),
            status: JobStatus::GotError,
            processed: 2,
            error: Some("Input file not found: /x.csv".to_string()),
            created_at: at,
            updated_at: at,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["status"], "got-error");
        assert_eq!(json["processed"], 2);
        assert_eq!(json["error"], "Input file not found: /x.csv");
        assert!(json["createdAt"].as_str().unwrap().starts_with("2026-02-05T12:00:00"));
    }

    #[test]
    fn test_snapshot_omits_missing_error() {
        let snapshot = JobSnapshot {
            id: "abc".to_string(),
            status: JobStatus::Running,
            processed: 0,
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("error"));
    }
}
