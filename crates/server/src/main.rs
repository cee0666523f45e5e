//! Orchestrator binary: wires the runtime and starts a fresh cycle
//! every `job_strategy.cycle_duration` seconds until stopped.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use faena_adapters::AppConfig;
use faena_jobs::CycleTemplate;
use faena_server::{bootstrap, install_shutdown_handler};

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

    let token = install_shutdown_handler();
    let runtime = match bootstrap(config, &token).await {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "bootstrap failed");
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.start().await {
        error!(error = %e, "startup failed");
        std::process::exit(1);
    }

    let strategy = runtime.config.job_strategy;
    let period = Duration::from_secs(strategy.cycle_duration.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycle_number: u64 = 0;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                cycle_number += 1;
                let template = CycleTemplate {
                    name: format!("cycle-{cycle_number}"),
                    strategy,
                };
                match runtime.jobs.start_cycle(template).await {
                    Ok(cycle) => info!(cycle_uuid = %cycle.uuid, name = %cycle.name, "cycle opened"),
                    Err(e) => error!(error = %e, "failed to open cycle"),
                }
            }
        }
    }

    runtime.shutdown().await;
}
