//! Worker agent.
//!
//! On start the agent announces itself on the register subject,
//! subscribes its private job subject and begins heartbeating. Every
//! received job runs through the configured [`JobHandler`]; the whole
//! job, with terminal status and timestamps filled in, goes back out
//! on the shared result subject. On stop the agent cancels its tasks
//! and deregisters best-effort.

pub mod handler;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use faena_core::{new_uuid, subjects, Job, JobStatus, WorkerControl};
use faena_ports::{BusError, MessageBus, Subscription};

pub use handler::{JobError, JobHandler, SyntheticHandler};

/// Agent identity and cadence.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub name: String,
    pub capabilities: Vec<String>,
    pub heartbeat_interval: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "worker".to_string(),
            capabilities: vec!["file_processing".to_string(), "task_execution".to_string()],
            heartbeat_interval: Duration::from_secs(5),
        }
    }
}

/// A single worker process connected to the bus.
pub struct WorkerAgent {
    bus: Arc<dyn MessageBus>,
    worker_id: String,
    config: AgentConfig,
    handler: Arc<dyn JobHandler>,
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerAgent {
    /// New agent with a fresh random identity.
    pub fn new(
        bus: Arc<dyn MessageBus>,
        config: AgentConfig,
        handler: Arc<dyn JobHandler>,
        token: CancellationToken,
    ) -> Self {
        Self {
            bus,
            worker_id: new_uuid(),
            config,
            handler,
            token,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Pin the identity instead of generating one. Reusing an id
    /// after a deregistration is supported; the dispatcher simply
    /// re-inserts it.
    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    /// Stable for the agent's lifetime.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Register, subscribe the private job subject and start the
    /// heartbeat ticker. A failed registration leaves the agent
    /// stopped; the caller may retry by calling `start` again.
    pub async fn start(&self) -> Result<(), BusError> {
        let register = WorkerControl::register(
            self.worker_id.clone(),
            self.config.name.clone(),
            self.config.capabilities.clone(),
        );
        let payload = serde_json::to_vec(&register)
            .map_err(|e| BusError::publish(subjects::WORKER_REGISTER, e))?;
        self.bus
            .publish(subjects::WORKER_REGISTER, payload.into())
            .await?;
        info!(worker_id = %self.worker_id, name = %self.config.name, "worker registered");

        let jobs = self
            .bus
            .subscribe(&subjects::job_for_worker(&self.worker_id))
            .await?;

        let mut tasks = self.tasks.lock().await;
        tasks.push(tokio::spawn(Self::run_jobs(
            jobs,
            Arc::clone(&self.bus),
            Arc::clone(&self.handler),
            self.token.clone(),
        )));
        tasks.push(tokio::spawn(Self::run_heartbeats(
            Arc::clone(&self.bus),
            self.worker_id.clone(),
            self.config.heartbeat_interval,
            self.token.clone(),
        )));
        Ok(())
    }

    /// Cancel the local tasks and deregister best-effort.
    pub async fn stop(&self) {
        self.token.cancel();
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }

        let deregister = WorkerControl::deregister(self.worker_id.clone());
        match serde_json::to_vec(&deregister) {
            Ok(payload) => {
                if let Err(e) = self
                    .bus
                    .publish(subjects::WORKER_DEREGISTER, payload.into())
                    .await
                {
                    warn!(worker_id = %self.worker_id, error = %e, "deregistration publish failed");
                }
            }
            Err(e) => warn!(error = %e, "deregistration encode failed"),
        }
        info!(worker_id = %self.worker_id, "worker stopped");
    }

    async fn run_jobs(
        mut sub: Subscription,
        bus: Arc<dyn MessageBus>,
        handler: Arc<dyn JobHandler>,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = sub.recv() => {
                    let Some(msg) = msg else { break };
                    let mut job: Job = match serde_json::from_slice(&msg.payload) {
                        Ok(job) => job,
                        Err(e) => {
                            warn!(error = %e, "dropping undecodable job");
                            continue;
                        }
                    };
                    info!(job_uuid = %job.uuid, job_name = %job.name, "job received");

                    job.start_at = Some(Utc::now());
                    job.status = JobStatus::Processing;
                    match handler.handle(&job).await {
                        Ok(output) => {
                            job.output_blob = Some(output);
                            job.status = JobStatus::Completed;
                        }
                        Err(e) => {
                            job.error = Some(e.to_string());
                            job.status = JobStatus::Failed;
                        }
                    }
                    job.done_at = Some(Utc::now());

                    match serde_json::to_vec(&job) {
                        Ok(payload) => {
                            // The job service owns retries; a lost
                            // result is recovered at cycle level.
                            if let Err(e) = bus.publish(subjects::JOB_RESULT, payload.into()).await {
                                warn!(job_uuid = %job.uuid, error = %e, "result publish failed");
                            }
                        }
                        Err(e) => warn!(job_uuid = %job.uuid, error = %e, "result encode failed"),
                    }
                    info!(job_uuid = %job.uuid, status = %job.status, "job finished");
                }
            }
        }
    }

    async fn run_heartbeats(
        bus: Arc<dyn MessageBus>,
        worker_id: String,
        interval: Duration,
        token: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let beat = WorkerControl::heartbeat(worker_id.clone());
                    let payload = match serde_json::to_vec(&beat) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(error = %e, "heartbeat encode failed");
                            continue;
                        }
                    };
                    if let Err(e) = bus.publish(subjects::WORKER_HEARTBEAT, payload.into()).await {
                        warn!(worker_id = %worker_id, error = %e, "heartbeat publish failed");
                    }
                }
            }
        }
    }
}
