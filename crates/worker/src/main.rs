//! Worker binary: connects to the bus, runs one agent until the
//! process is asked to stop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use faena_adapters::{AppConfig, NatsBus};
use faena_ports::MessageBus;
use faena_worker::{AgentConfig, SyntheticHandler, WorkerAgent};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let bus: Arc<dyn MessageBus> = match connect_with_retry(&config.broker).await {
        Ok(bus) => bus,
        Err(e) => {
            error!(broker = %config.broker, error = %e, "could not reach the bus");
            std::process::exit(1);
        }
    };

    let token = CancellationToken::new();
    let agent = WorkerAgent::new(
        bus,
        AgentConfig::default(),
        Arc::new(SyntheticHandler),
        token.child_token(),
    );

    if let Err(e) = agent.start().await {
        error!(error = %e, "agent failed to start");
        std::process::exit(1);
    }
    info!(worker_id = %agent.worker_id(), "worker running");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "signal handler failed");
    }
    info!("shutting down");
    agent.stop().await;
}

async fn connect_with_retry(broker: &str) -> Result<Arc<NatsBus>, faena_ports::BusError> {
    let mut delay = Duration::from_millis(500);
    let max_delay = Duration::from_secs(8);
    let mut attempts = 0;

    loop {
        match NatsBus::connect(broker).await {
            Ok(bus) => return Ok(Arc::new(bus)),
            Err(e) => {
                attempts += 1;
                if attempts >= 5 {
                    return Err(e);
                }
                warn!(broker, error = %e, "bus connect failed, retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(max_delay);
            }
        }
    }
}
