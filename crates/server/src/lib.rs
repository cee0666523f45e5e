//! Orchestrator wiring: explicit startup and shutdown of the bus,
//! store, generator, dispatcher and job service.

pub mod bootstrap;
pub mod shutdown;

pub use bootstrap::{bootstrap, BootstrapError, Runtime};
pub use shutdown::install_shutdown_handler;
