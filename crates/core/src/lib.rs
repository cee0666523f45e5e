//! Domain model for the faena synthetic workload orchestrator.
//!
//! This crate holds the entity types shared by every other workspace
//! member: workers, jobs, cycles, the generated user/file/workspace
//! entities, the generation strategies, and the control-plane message
//! types exchanged over the bus.

pub mod cycle;
pub mod entities;
pub mod error;
pub mod job;
pub mod messages;
pub mod strategy;
pub mod worker;

pub use cycle::{Cycle, CycleStatus, Session};
pub use entities::{File, User, Workspace};
pub use error::DomainError;
pub use job::{Job, JobStatus};
pub use messages::{subjects, WorkerControl};
pub use strategy::{
    FileStrategy, GeneratorSettings, JobStrategy, Strategy, UserStrategy, WorkspaceStrategy,
};
pub use worker::Worker;

pub type Result<T, E = DomainError> = std::result::Result<T, E>;

/// Fresh string uuid, the id format used across all entities.
pub fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
