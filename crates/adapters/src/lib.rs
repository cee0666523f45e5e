//! Adapters behind the `faena-ports` seams:
//! - `InMemoryBus`: bounded in-process pub/sub for tests and
//!   single-process runs.
//! - `NatsBus`: distributed pub/sub over a NATS broker.
//! - `SqliteStore`: key-addressed CRUD on SQLite via sqlx.
//! - `AppConfig`: YAML configuration loading and validation.

pub mod bus;
pub mod config;
pub mod store;

pub use bus::{nats::NatsBus, InMemoryBus};
pub use config::{AppConfig, ConfigError};
pub use store::SqliteStore;
