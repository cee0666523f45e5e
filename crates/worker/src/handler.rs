//! Job handlers.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use faena_core::Job;

/// Failure of a single job execution. The message ends up in the
/// job's `error` field on the result subject.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct JobError(pub String);

impl JobError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Executes the payload of one job and produces its output blob.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> Result<Value, JobError>;
}

/// Default handler: echoes the requested action back as the output
/// blob after a short simulated service time.
#[derive(Debug, Default)]
pub struct SyntheticHandler;

#[async_trait]
impl JobHandler for SyntheticHandler {
    async fn handle(&self, job: &Job) -> Result<Value, JobError> {
        let delay_ms = {
            use rand::Rng;
            rand::thread_rng().gen_range(1..=20)
        };
        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;

        Ok(serde_json::json!({
            "result": "processed",
            "action": job.input_blob.get("action").cloned().unwrap_or(Value::Null),
            "user_id": job.input_blob.get("user_id").cloned().unwrap_or(Value::Null),
        }))
    }
}
