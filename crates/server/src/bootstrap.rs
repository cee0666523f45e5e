//! Component construction and lifecycle.
//!
//! Components are built in leaf order (bus → store → generator →
//! dispatcher → job service), each holding a child of the runtime's
//! cancellation token. Shutdown stops them in reverse order and
//! drains every background task before returning. There is no
//! container and no discovery; the wiring is exactly what is written
//! here.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use faena_adapters::{AppConfig, ConfigError, NatsBus, SqliteStore};
use faena_dispatcher::{Dispatcher, DispatcherConfig};
use faena_generator::{Generator, GeneratorError};
use faena_jobs::{JobService, JobServiceConfig};
use faena_ports::{BusError, MessageBus, Store, StoreError};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),
}

/// The wired components of one orchestrator process.
pub struct Runtime {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub generator: Arc<Generator>,
    pub dispatcher: Arc<Dispatcher>,
    pub jobs: JobService,
}

/// Construct every component. Initialization failures (unreachable
/// bus, unopenable store, invalid strategies) abort here; nothing has
/// started yet.
pub async fn bootstrap(
    config: AppConfig,
    token: &CancellationToken,
) -> Result<Runtime, BootstrapError> {
    info!(broker = %config.broker, "connecting to bus");
    let bus: Arc<dyn MessageBus> = Arc::new(NatsBus::connect(&config.broker).await?);

    info!(dsn = %config.dsn, "opening store");
    let store = Arc::new(SqliteStore::connect(&config.dsn).await?);
    store.init_schema().await?;
    let store: Arc<dyn Store> = store;

    let generator = Arc::new(Generator::new(
        config.generator.clone(),
        PathBuf::from(&config.repository_path),
        token.child_token(),
        None,
    )?);

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&bus),
        DispatcherConfig::default(),
        token.child_token(),
    ));

    let jobs = JobService::new(
        Arc::clone(&store),
        Arc::clone(&dispatcher),
        Arc::clone(&generator),
        JobServiceConfig::default(),
        token.child_token(),
    );

    Ok(Runtime {
        config,
        store,
        generator,
        dispatcher,
        jobs,
    })
}

impl Runtime {
    /// Start the components, leaves first.
    pub async fn start(&self) -> Result<(), BusError> {
        self.generator.start().await;
        self.dispatcher.start().await?;
        self.jobs.start().await?;
        info!("runtime started");
        Ok(())
    }

    /// Stop in reverse construction order, draining each component's
    /// tasks before moving on.
    pub async fn shutdown(&self) {
        self.jobs.stop().await;
        self.dispatcher.stop().await;
        self.generator.stop().await;
        info!("runtime stopped");
    }
}
