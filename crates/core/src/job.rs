//! Job entity and status lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

/// Lifecycle status of a job.
///
/// A job is `Pending` until the dispatch loop hands it to a worker,
/// `Dispatched` while in flight, `Processing` on the worker, and ends
/// in `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Dispatched,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Dispatched => "dispatched",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Statuses from which the job can still make progress.
    pub const OPEN: [JobStatus; 3] = [
        JobStatus::Pending,
        JobStatus::Dispatched,
        JobStatus::Processing,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "dispatched" => Ok(JobStatus::Dispatched),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unit of simulated user activity.
///
/// The whole structure travels over the bus: the dispatcher publishes
/// it to the selected worker, and the worker publishes it back on the
/// result subject with the terminal fields filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
    pub input_blob: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_blob: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    #[serde(default)]
    pub cycle_uuid: String,
    #[serde(default)]
    pub session_id: String,
}

impl Job {
    /// New pending job bound to a cycle and session.
    pub fn pending(
        name: impl Into<String>,
        input_blob: Value,
        cycle_uuid: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            uuid: crate::new_uuid(),
            name: name.into(),
            worker_id: None,
            input_blob,
            output_blob: None,
            error: None,
            start_at: None,
            done_at: None,
            status: JobStatus::Pending,
            cycle_uuid: cycle_uuid.into(),
            session_id: session_id.into(),
        }
    }

    /// Terminal invariant: a completed or failed job carries `done_at`
    /// and a fixed `worker_id`.
    pub fn is_well_formed_terminal(&self) -> bool {
        !self.status.is_terminal() || (self.done_at.is_some() && self.worker_id.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<JobStatus>("\"dispatched\"").unwrap(),
            JobStatus::Dispatched
        );
    }

    #[test]
    fn status_round_trips_via_str() {
        for status in [
            JobStatus::Pending,
            JobStatus::Dispatched,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(JobStatus::from_str("nonsense").is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn pending_job_has_fresh_identity() {
        let a = Job::pending("upload_file", serde_json::json!({"a": 1}), "c1", "s1");
        let b = Job::pending("upload_file", serde_json::json!({"a": 1}), "c1", "s1");
        assert_ne!(a.uuid, b.uuid);
        assert_eq!(a.status, JobStatus::Pending);
        assert!(a.worker_id.is_none());
        assert!(a.is_well_formed_terminal());
    }

    #[test]
    fn job_wire_format_omits_unset_fields() {
        let job = Job::pending("consult_file", serde_json::json!({}), "c1", "s1");
        let wire = serde_json::to_value(&job).unwrap();
        assert!(wire.get("worker_id").is_none());
        assert!(wire.get("done_at").is_none());
        assert_eq!(wire["status"], "pending");
    }
}
