//! Cycle orchestration.
//!
//! `JobService` drives a cycle end to end: it drains users from the
//! generator, materializes their session jobs as pending rows, feeds
//! pending rows through the dispatcher on a fixed tick, ingests
//! results from the shared result subject and closes the cycle once
//! no job in it can still make progress.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use faena_core::{subjects, Cycle, CycleStatus, Job, JobStatus, JobStrategy, Session};
use faena_dispatcher::Dispatcher;
use faena_generator::Generator;
use faena_ports::{BusError, Store, StoreError, Subscription};

/// Ordered action set; job `i` of a session performs action
/// `i mod 9`.
pub const ACTIONS: [&str; 9] = [
    "create_user",
    "update_user",
    "delete_user",
    "create_workspace",
    "update_workspace",
    "delete_workspace",
    "upload_file",
    "download_file",
    "consult_file",
];

#[derive(Debug, Clone, Copy)]
pub struct JobServiceConfig {
    pub dispatch_interval: Duration,
}

impl Default for JobServiceConfig {
    fn default() -> Self {
        Self {
            dispatch_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Error)]
pub enum JobServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Template for opening a cycle.
#[derive(Debug, Clone)]
pub struct CycleTemplate {
    pub name: String,
    pub strategy: JobStrategy,
}

/// Cycle state machine and dispatch/result plumbing.
pub struct JobService {
    store: Arc<dyn Store>,
    dispatcher: Arc<Dispatcher>,
    generator: Arc<Generator>,
    config: JobServiceConfig,
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl JobService {
    pub fn new(
        store: Arc<dyn Store>,
        dispatcher: Arc<Dispatcher>,
        generator: Arc<Generator>,
        config: JobServiceConfig,
        token: CancellationToken,
    ) -> Self {
        Self {
            store,
            dispatcher,
            generator,
            config,
            token,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe the result subject (exactly once for the service's
    /// lifetime) and spawn the result consumer and dispatch ticker.
    pub async fn start(&self) -> Result<(), BusError> {
        let results = self.dispatcher.subscribe(subjects::JOB_RESULT).await?;

        let mut tasks = self.tasks.lock().await;
        tasks.push(tokio::spawn(Self::run_results(
            results,
            Arc::clone(&self.store),
            self.token.clone(),
        )));

        let store = Arc::clone(&self.store);
        let dispatcher = Arc::clone(&self.dispatcher);
        let interval = self.config.dispatch_interval;
        let token = self.token.clone();
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => Self::dispatch_pending(&store, &dispatcher).await,
                }
            }
        }));

        info!("job service started");
        Ok(())
    }

    /// Cancel the background tasks and wait for them to drain.
    pub async fn stop(&self) {
        self.token.cancel();
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
        info!("job service stopped");
    }

    /// Open a cycle: persist it, drain up to `max_users` users from
    /// the generator and persist one pending job per session action
    /// slot. Dispatch happens asynchronously on the background tick.
    ///
    /// A generator that runs dry short of `max_users` is not an
    /// error; the cycle simply tracks fewer sessions. Cancellation
    /// mid-drain stops cleanly with the sessions synthesized so far.
    pub async fn start_cycle(&self, template: CycleTemplate) -> Result<Cycle, JobServiceError> {
        let cycle = Cycle::start(template.name, template.strategy);
        self.store.create_cycle(&cycle).await?;

        let mut users = Vec::with_capacity(template.strategy.max_users);
        for _ in 0..template.strategy.max_users {
            tokio::select! {
                _ = self.token.cancelled() => break,
                user = self.generator.next_user() => match user {
                    Some(user) => users.push(user),
                    None => break,
                },
            }
        }

        let jobs_per_session = template.strategy.jobs_per_session();
        for mut user in users {
            user.cycle_uuid = cycle.uuid.clone();
            user.session_id = user.username.clone();
            self.store.create_user(&user).await?;

            let session = Session::for_user(user.username.clone());
            for i in 0..jobs_per_session {
                let action = ACTIONS[i % ACTIONS.len()];
                let input = serde_json::json!({
                    "user_id": session.user_id.clone(),
                    "action": action,
                });
                let job = Job::pending(action, input, cycle.uuid.clone(), session.user_id.clone());
                self.store.create_job(&job).await?;
            }
        }

        info!(cycle_uuid = %cycle.uuid, name = %cycle.name, "cycle started");
        Ok(cycle)
    }

    /// One dispatch tick: push every pending row through the
    /// dispatcher. A failed dispatch leaves the row pending, which is
    /// the implicit retry on the next tick.
    async fn dispatch_pending(store: &Arc<dyn Store>, dispatcher: &Arc<Dispatcher>) {
        let jobs = match store.get_jobs_by_status(JobStatus::Pending).await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "failed to load pending jobs");
                return;
            }
        };

        for mut job in jobs {
            match dispatcher.dispatch_job(&mut job).await {
                Ok(()) => {
                    job.status = JobStatus::Dispatched;
                    if let Err(e) = store.update_job(&job).await {
                        error!(job_uuid = %job.uuid, error = %e, "failed to persist dispatch");
                    }
                }
                Err(e) => {
                    warn!(job_uuid = %job.uuid, error = %e, "dispatch failed, job stays pending");
                }
            }
        }
    }

    async fn run_results(mut sub: Subscription, store: Arc<dyn Store>, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = sub.recv() => {
                    let Some(msg) = msg else { break };
                    let job: Job = match serde_json::from_slice(&msg.payload) {
                        Ok(job) => job,
                        Err(e) => {
                            warn!(error = %e, "dropping undecodable result");
                            continue;
                        }
                    };
                    // Overwrite is idempotent over the job uuid:
                    // a replayed terminal result is a no-op.
                    if let Err(e) = store.update_job(&job).await {
                        error!(job_uuid = %job.uuid, error = %e, "failed to record result");
                        continue;
                    }
                    info!(job_uuid = %job.uuid, status = %job.status, "result recorded");

                    if let Err(e) = Self::check_cycle_completion(&store, &job.cycle_uuid).await {
                        error!(cycle_uuid = %job.cycle_uuid, error = %e, "completion check failed");
                    }
                }
            }
        }
    }

    /// Close the cycle once none of its jobs are pending, dispatched
    /// or processing. Scoped to the one cycle so unrelated traffic
    /// cannot hold a completion hostage.
    async fn check_cycle_completion(
        store: &Arc<dyn Store>,
        cycle_uuid: &str,
    ) -> Result<(), StoreError> {
        if cycle_uuid.is_empty() {
            return Ok(());
        }
        let open = store.count_cycle_jobs_in(cycle_uuid, &JobStatus::OPEN).await?;
        if open > 0 {
            return Ok(());
        }

        let mut cycle = store.get_cycle(cycle_uuid).await?;
        if cycle.status == CycleStatus::Completed {
            return Ok(());
        }
        if cycle.complete().is_ok() {
            store.update_cycle(&cycle).await?;
            info!(cycle_uuid = %cycle.uuid, "cycle completed");
        }
        Ok(())
    }
}
