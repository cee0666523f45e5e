//! Control-plane message types and bus subject names.

use serde::{Deserialize, Serialize};

/// Bus subjects spoken by the dispatcher, workers and the job service.
pub mod subjects {
    pub const WORKER_REGISTER: &str = "dispatcher.worker.register";
    pub const WORKER_HEARTBEAT: &str = "dispatcher.worker.heartbeat";
    pub const WORKER_DEREGISTER: &str = "dispatcher.worker.deregister";
    pub const JOB_RESULT: &str = "dispatcher.job.result";

    /// Per-worker job delivery subject.
    pub fn job_for_worker(worker_id: &str) -> String {
        format!("dispatcher.job.{worker_id}")
    }
}

/// Membership message carried on the three worker control subjects.
///
/// One shape serves registration, heartbeat and deregistration; each
/// consumer checks the `status` literal for its own subject and drops
/// anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerControl {
    pub worker_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub status: String,
}

impl WorkerControl {
    pub const REGISTERED: &'static str = "registered";
    pub const HEARTBEAT: &'static str = "heartbeat";
    pub const DEREGISTERED: &'static str = "deregistered";

    pub fn register(
        worker_id: impl Into<String>,
        name: impl Into<String>,
        capabilities: Vec<String>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            name: name.into(),
            capabilities,
            status: Self::REGISTERED.to_string(),
        }
    }

    pub fn heartbeat(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            name: String::new(),
            capabilities: Vec::new(),
            status: Self::HEARTBEAT.to_string(),
        }
    }

    pub fn deregister(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            name: String::new(),
            capabilities: Vec::new(),
            status: Self::DEREGISTERED.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_subject_embeds_worker_id() {
        assert_eq!(subjects::job_for_worker("w1"), "dispatcher.job.w1");
    }

    #[test]
    fn heartbeat_omits_name_and_capabilities_defaults() {
        let raw = r#"{"worker_id":"w1","status":"heartbeat"}"#;
        let msg: WorkerControl = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.worker_id, "w1");
        assert_eq!(msg.status, WorkerControl::HEARTBEAT);
        assert!(msg.name.is_empty());
        assert!(msg.capabilities.is_empty());
    }

    #[test]
    fn register_carries_capabilities() {
        let msg = WorkerControl::register("w1", "W", vec!["x".into()]);
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["status"], "registered");
        assert_eq!(wire["capabilities"][0], "x");
    }
}
