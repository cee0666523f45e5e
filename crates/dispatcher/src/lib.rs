//! Dispatcher: live worker membership and job dispatch.
//!
//! Three bus subjects feed the membership plane (register, heartbeat,
//! deregister), each drained by its own consumer task; a sweeper
//! ticker evicts workers whose last heartbeat is older than the
//! liveness timeout. Dispatch takes a registry snapshot, picks a
//! worker through the selection policy and publishes the job on the
//! worker's private subject.

pub mod policy;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use faena_core::{subjects, Job, Worker, WorkerControl};
use faena_ports::{BusError, BusMessage, MessageBus, Subscription};

pub use policy::{RandomPolicy, SelectionPolicy};

type WorkerMap = Arc<RwLock<HashMap<String, Worker>>>;
type HeartbeatMap = Arc<RwLock<HashMap<String, Instant>>>;

/// Timing knobs for the liveness sweeper.
///
/// The defaults tolerate two missed 5 s heartbeats before eviction.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    pub sweep_interval: Duration,
    pub liveness_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(10),
            liveness_timeout: Duration::from_secs(15),
        }
    }
}

/// Dispatch failure modes. Callers own the retry decision.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no active workers available")]
    NoWorkers,

    #[error("failed to serialize job: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Live membership plane plus dispatch.
pub struct Dispatcher {
    bus: Arc<dyn MessageBus>,
    config: DispatcherConfig,
    policy: Box<dyn SelectionPolicy>,
    workers: WorkerMap,
    last_heartbeat: HeartbeatMap,
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new(bus: Arc<dyn MessageBus>, config: DispatcherConfig, token: CancellationToken) -> Self {
        Self::with_policy(bus, config, token, Box::new(RandomPolicy))
    }

    pub fn with_policy(
        bus: Arc<dyn MessageBus>,
        config: DispatcherConfig,
        token: CancellationToken,
        policy: Box<dyn SelectionPolicy>,
    ) -> Self {
        Self {
            bus,
            config,
            policy,
            workers: Arc::new(RwLock::new(HashMap::new())),
            last_heartbeat: Arc::new(RwLock::new(HashMap::new())),
            token,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe the membership subjects and spawn the consumer and
    /// sweeper tasks. A subscribe failure here is fatal: without the
    /// membership plane the dispatcher is useless.
    pub async fn start(&self) -> Result<(), BusError> {
        let register = self.bus.subscribe(subjects::WORKER_REGISTER).await?;
        let heartbeat = self.bus.subscribe(subjects::WORKER_HEARTBEAT).await?;
        let deregister = self.bus.subscribe(subjects::WORKER_DEREGISTER).await?;

        let mut tasks = self.tasks.lock().await;
        tasks.push(tokio::spawn(Self::run_registrations(
            register,
            Arc::clone(&self.workers),
            Arc::clone(&self.last_heartbeat),
            self.token.clone(),
        )));
        tasks.push(tokio::spawn(Self::run_heartbeats(
            heartbeat,
            Arc::clone(&self.workers),
            Arc::clone(&self.last_heartbeat),
            self.token.clone(),
        )));
        tasks.push(tokio::spawn(Self::run_deregistrations(
            deregister,
            Arc::clone(&self.workers),
            Arc::clone(&self.last_heartbeat),
            self.token.clone(),
        )));
        tasks.push(tokio::spawn(Self::run_sweeper(
            self.config,
            Arc::clone(&self.workers),
            Arc::clone(&self.last_heartbeat),
            self.token.clone(),
        )));

        info!("dispatcher started");
        Ok(())
    }

    /// Cancel the background tasks and wait for them to drain.
    pub async fn stop(&self) {
        self.token.cancel();
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
        info!("dispatcher stopped");
    }

    /// Bus passthrough.
    pub async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), BusError> {
        self.bus.publish(subject, payload).await
    }

    /// Bus passthrough.
    pub async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        self.bus.subscribe(subject).await
    }

    /// Snapshot of the live workers at call time. Later registry
    /// changes are not reflected in the returned vector.
    pub async fn get_active_workers(&self) -> Vec<Worker> {
        self.workers.read().await.values().cloned().collect()
    }

    /// Dispatch one job to a live worker.
    ///
    /// Stamps `job.worker_id` with the selected worker and publishes
    /// the serialized job on the worker's subject. The job may still
    /// be lost if the worker is evicted right after the snapshot;
    /// the cycle-level retry logic owns that case.
    pub async fn dispatch_job(&self, job: &mut Job) -> Result<(), DispatchError> {
        let snapshot = self.get_active_workers().await;
        let worker = self.policy.select(&snapshot).ok_or(DispatchError::NoWorkers)?;

        job.worker_id = Some(worker.uuid.clone());
        let payload = serde_json::to_vec(job)?;
        let subject = subjects::job_for_worker(&worker.uuid);
        self.bus.publish(&subject, payload.into()).await?;

        info!(
            job_uuid = %job.uuid,
            job_name = %job.name,
            worker_id = %worker.uuid,
            "dispatched job"
        );
        Ok(())
    }

    fn decode(msg: &BusMessage) -> Option<WorkerControl> {
        match serde_json::from_slice(&msg.payload) {
            Ok(control) => Some(control),
            Err(e) => {
                warn!(subject = %msg.subject, error = %e, "dropping malformed membership message");
                None
            }
        }
    }

    async fn run_registrations(
        mut sub: Subscription,
        workers: WorkerMap,
        heartbeats: HeartbeatMap,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = sub.recv() => {
                    let Some(msg) = msg else { break };
                    let Some(control) = Self::decode(&msg) else { continue };
                    if control.status != WorkerControl::REGISTERED {
                        continue;
                    }
                    let worker = Worker::new(control.worker_id.clone(), control.name.clone())
                        .with_capabilities(control.capabilities.clone());
                    workers.write().await.insert(control.worker_id.clone(), worker);
                    heartbeats
                        .write()
                        .await
                        .insert(control.worker_id.clone(), Instant::now());
                    info!(
                        worker_id = %control.worker_id,
                        name = %control.name,
                        capabilities = ?control.capabilities,
                        "worker registered"
                    );
                }
            }
        }
    }

    async fn run_heartbeats(
        mut sub: Subscription,
        workers: WorkerMap,
        heartbeats: HeartbeatMap,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = sub.recv() => {
                    let Some(msg) = msg else { break };
                    let Some(control) = Self::decode(&msg) else { continue };
                    if control.status != WorkerControl::HEARTBEAT {
                        continue;
                    }
                    // A heartbeat never promotes an unknown worker
                    // into the registry.
                    if !workers.read().await.contains_key(&control.worker_id) {
                        debug!(worker_id = %control.worker_id, "heartbeat from unknown worker");
                        continue;
                    }
                    heartbeats
                        .write()
                        .await
                        .insert(control.worker_id.clone(), Instant::now());
                    debug!(worker_id = %control.worker_id, "heartbeat");
                }
            }
        }
    }

    async fn run_deregistrations(
        mut sub: Subscription,
        workers: WorkerMap,
        heartbeats: HeartbeatMap,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = sub.recv() => {
                    let Some(msg) = msg else { break };
                    let Some(control) = Self::decode(&msg) else { continue };
                    if control.status != WorkerControl::DEREGISTERED {
                        continue;
                    }
                    heartbeats.write().await.remove(&control.worker_id);
                    workers.write().await.remove(&control.worker_id);
                    info!(worker_id = %control.worker_id, "worker deregistered");
                }
            }
        }
    }

    async fn run_sweeper(
        config: DispatcherConfig,
        workers: WorkerMap,
        heartbeats: HeartbeatMap,
        token: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let now = Instant::now();
                    // The heartbeat lock is released before the
                    // registry lock is taken; the two are never
                    // held together.
                    let expired: Vec<String> = {
                        let mut heartbeats = heartbeats.write().await;
                        let expired: Vec<String> = heartbeats
                            .iter()
                            .filter(|(_, last)| now.duration_since(**last) > config.liveness_timeout)
                            .map(|(id, _)| id.clone())
                            .collect();
                        for id in &expired {
                            heartbeats.remove(id);
                        }
                        expired
                    };
                    if expired.is_empty() {
                        continue;
                    }
                    let mut workers = workers.write().await;
                    for id in expired {
                        workers.remove(&id);
                        info!(worker_id = %id, "evicted inactive worker");
                    }
                }
            }
        }
    }
}
