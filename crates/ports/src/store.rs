//! Persistence port: key-addressed CRUD over the entity types plus
//! the job status queries the dispatch and completion loops need.

use async_trait::async_trait;
use thiserror::Error;

use faena_core::{Cycle, File, Job, JobStatus, User, Worker, Workspace};

/// Errors surfaced by store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store open failed: {0}")]
    Open(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("row decode failed: {0}")]
    Decode(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Durable row owner. Updates are single-row atomic upserts; there are
/// no cross-row transactional guarantees, and result handlers rely on
/// last-write-wins idempotency over the job uuid.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_job(&self, job: &Job) -> Result<(), StoreError>;
    async fn get_job(&self, id: &str) -> Result<Job, StoreError>;
    async fn update_job(&self, job: &Job) -> Result<(), StoreError>;
    async fn delete_job(&self, id: &str) -> Result<(), StoreError>;
    async fn get_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, StoreError>;
    /// Count of jobs in one cycle whose status is any of `statuses`.
    async fn count_cycle_jobs_in(
        &self,
        cycle_uuid: &str,
        statuses: &[JobStatus],
    ) -> Result<u64, StoreError>;

    async fn create_worker(&self, worker: &Worker) -> Result<(), StoreError>;
    async fn get_worker(&self, id: &str) -> Result<Worker, StoreError>;
    async fn update_worker(&self, worker: &Worker) -> Result<(), StoreError>;
    async fn delete_worker(&self, id: &str) -> Result<(), StoreError>;

    async fn create_user(&self, user: &User) -> Result<(), StoreError>;
    async fn get_user(&self, id: &str) -> Result<User, StoreError>;
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;
    async fn delete_user(&self, id: &str) -> Result<(), StoreError>;

    async fn create_file(&self, file: &File) -> Result<(), StoreError>;
    async fn get_file(&self, id: &str) -> Result<File, StoreError>;
    async fn update_file(&self, file: &File) -> Result<(), StoreError>;
    async fn delete_file(&self, id: &str) -> Result<(), StoreError>;

    async fn create_workspace(&self, workspace: &Workspace) -> Result<(), StoreError>;
    async fn get_workspace(&self, id: &str) -> Result<Workspace, StoreError>;
    async fn update_workspace(&self, workspace: &Workspace) -> Result<(), StoreError>;
    async fn delete_workspace(&self, id: &str) -> Result<(), StoreError>;

    async fn create_cycle(&self, cycle: &Cycle) -> Result<(), StoreError>;
    async fn get_cycle(&self, id: &str) -> Result<Cycle, StoreError>;
    async fn update_cycle(&self, cycle: &Cycle) -> Result<(), StoreError>;
    async fn delete_cycle(&self, id: &str) -> Result<(), StoreError>;
}
