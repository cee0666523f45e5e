//! SQLite store adapter.
//!
//! Key-addressed CRUD: every entity lands in its own table as a JSON
//! payload column keyed by uuid. Jobs additionally carry dedicated
//! `status` and `cycle_uuid` columns for the secondary queries the
//! dispatch and completion loops run. Updates are `INSERT OR REPLACE`
//! upserts, which gives single-row atomicity and the last-write-wins
//! behavior the result handler relies on.

use std::str::FromStr;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::info;

use faena_core::{Cycle, File, Job, JobStatus, User, Worker, Workspace};
use faena_ports::{Store, StoreError};

const ENTITY_TABLES: [&str; 5] = ["workers", "users", "files", "workspaces", "cycles"];

/// Store implementation over a SQLite pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the database behind `dsn` (e.g. `sqlite::memory:` or
    /// `sqlite://faena.db`), creating the file when missing.
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(dsn)
            .map_err(|e| StoreError::Open(format!("{dsn}: {e}")))?
            .create_if_missing(true);
        // A single connection keeps writers serialized and makes the
        // in-memory DSN hold one shared database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Open(format!("{dsn}: {e}")))?;
        Ok(Self { pool })
    }

    /// Create tables and indexes.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                uuid TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                cycle_uuid TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(query_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)")
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_jobs_cycle_status ON jobs(cycle_uuid, status)",
        )
        .execute(&self.pool)
        .await
        .map_err(query_err)?;

        for table in ENTITY_TABLES {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (uuid TEXT PRIMARY KEY, data TEXT NOT NULL)"
            ))
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        }

        info!("store schema initialized");
        Ok(())
    }

    async fn insert<T: Serialize>(
        &self,
        table: &str,
        uuid: &str,
        entity: &T,
    ) -> Result<(), StoreError> {
        let data = encode(entity)?;
        sqlx::query(&format!("INSERT INTO {table} (uuid, data) VALUES (?1, ?2)"))
            .bind(uuid)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        Ok(())
    }

    async fn upsert<T: Serialize>(
        &self,
        table: &str,
        uuid: &str,
        entity: &T,
    ) -> Result<(), StoreError> {
        let data = encode(entity)?;
        sqlx::query(&format!(
            "INSERT OR REPLACE INTO {table} (uuid, data) VALUES (?1, ?2)"
        ))
        .bind(uuid)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(query_err)?;
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        table: &'static str,
        entity: &'static str,
        uuid: &str,
    ) -> Result<T, StoreError> {
        let row = sqlx::query(&format!("SELECT data FROM {table} WHERE uuid = ?1"))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?
            .ok_or_else(|| StoreError::not_found(entity, uuid))?;
        decode(&row.get::<String, _>("data"))
    }

    async fn remove(&self, table: &str, uuid: &str) -> Result<(), StoreError> {
        sqlx::query(&format!("DELETE FROM {table} WHERE uuid = ?1"))
            .bind(uuid)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        Ok(())
    }

    async fn write_job(&self, job: &Job, replace: bool) -> Result<(), StoreError> {
        let verb = if replace { "INSERT OR REPLACE" } else { "INSERT" };
        let data = encode(job)?;
        sqlx::query(&format!(
            "{verb} INTO jobs (uuid, status, cycle_uuid, data) VALUES (?1, ?2, ?3, ?4)"
        ))
        .bind(&job.uuid)
        .bind(job.status.as_str())
        .bind(&job.cycle_uuid)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(query_err)?;
        Ok(())
    }
}

fn query_err(e: sqlx::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

fn encode<T: Serialize>(entity: &T) -> Result<String, StoreError> {
    serde_json::to_string(entity).map_err(|e| StoreError::Decode(e.to_string()))
}

fn decode<T: DeserializeOwned>(data: &str) -> Result<T, StoreError> {
    serde_json::from_str(data).map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_job(&self, job: &Job) -> Result<(), StoreError> {
        self.write_job(job, false).await
    }

    async fn get_job(&self, id: &str) -> Result<Job, StoreError> {
        self.fetch("jobs", "job", id).await
    }

    async fn update_job(&self, job: &Job) -> Result<(), StoreError> {
        self.write_job(job, true).await
    }

    async fn delete_job(&self, id: &str) -> Result<(), StoreError> {
        self.remove("jobs", id).await
    }

    async fn get_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query("SELECT data FROM jobs WHERE status = ?1 ORDER BY rowid")
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.iter()
            .map(|row| decode(&row.get::<String, _>("data")))
            .collect()
    }

    async fn count_cycle_jobs_in(
        &self,
        cycle_uuid: &str,
        statuses: &[JobStatus],
    ) -> Result<u64, StoreError> {
        if statuses.is_empty() {
            return Ok(0);
        }
        let placeholders = (0..statuses.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT COUNT(*) AS n FROM jobs WHERE cycle_uuid = ?1 AND status IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(cycle_uuid);
        for status in statuses {
            query = query.bind(status.as_str());
        }
        let row = query.fetch_one(&self.pool).await.map_err(query_err)?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn create_worker(&self, worker: &Worker) -> Result<(), StoreError> {
        self.insert("workers", &worker.uuid, worker).await
    }

    async fn get_worker(&self, id: &str) -> Result<Worker, StoreError> {
        self.fetch("workers", "worker", id).await
    }

    async fn update_worker(&self, worker: &Worker) -> Result<(), StoreError> {
        self.upsert("workers", &worker.uuid, worker).await
    }

    async fn delete_worker(&self, id: &str) -> Result<(), StoreError> {
        self.remove("workers", id).await
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.insert("users", &user.uuid, user).await
    }

    async fn get_user(&self, id: &str) -> Result<User, StoreError> {
        self.fetch("users", "user", id).await
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        self.upsert("users", &user.uuid, user).await
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.remove("users", id).await
    }

    async fn create_file(&self, file: &File) -> Result<(), StoreError> {
        self.insert("files", &file.uuid, file).await
    }

    async fn get_file(&self, id: &str) -> Result<File, StoreError> {
        self.fetch("files", "file", id).await
    }

    async fn update_file(&self, file: &File) -> Result<(), StoreError> {
        self.upsert("files", &file.uuid, file).await
    }

    async fn delete_file(&self, id: &str) -> Result<(), StoreError> {
        self.remove("files", id).await
    }

    async fn create_workspace(&self, workspace: &Workspace) -> Result<(), StoreError> {
        self.insert("workspaces", &workspace.uuid, workspace).await
    }

    async fn get_workspace(&self, id: &str) -> Result<Workspace, StoreError> {
        self.fetch("workspaces", "workspace", id).await
    }

    async fn update_workspace(&self, workspace: &Workspace) -> Result<(), StoreError> {
        self.upsert("workspaces", &workspace.uuid, workspace).await
    }

    async fn delete_workspace(&self, id: &str) -> Result<(), StoreError> {
        self.remove("workspaces", id).await
    }

    async fn create_cycle(&self, cycle: &Cycle) -> Result<(), StoreError> {
        self.insert("cycles", &cycle.uuid, cycle).await
    }

    async fn get_cycle(&self, id: &str) -> Result<Cycle, StoreError> {
        self.fetch("cycles", "cycle", id).await
    }

    async fn update_cycle(&self, cycle: &Cycle) -> Result<(), StoreError> {
        self.upsert("cycles", &cycle.uuid, cycle).await
    }

    async fn delete_cycle(&self, id: &str) -> Result<(), StoreError> {
        self.remove("cycles", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faena_core::JobStrategy;

    async fn memory_store() -> SqliteStore {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        store.init_schema().await.unwrap();
        store
    }

    fn sample_job(cycle: &str, status: JobStatus) -> Job {
        let mut job = Job::pending(
            "upload_file",
            serde_json::json!({"user_id": "u1", "action": "upload_file"}),
            cycle,
            "u1",
        );
        job.status = status;
        job
    }

    #[tokio::test]
    async fn job_crud_round_trip() {
        let store = memory_store().await;
        let job = sample_job("c1", JobStatus::Pending);

        store.create_job(&job).await.unwrap();
        let loaded = store.get_job(&job.uuid).await.unwrap();
        assert_eq!(loaded, job);

        store.delete_job(&job.uuid).await.unwrap();
        assert!(matches!(
            store.get_job(&job.uuid).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_create_fails_but_update_upserts() {
        let store = memory_store().await;
        let mut job = sample_job("c1", JobStatus::Pending);
        store.create_job(&job).await.unwrap();
        assert!(store.create_job(&job).await.is_err());

        job.status = JobStatus::Completed;
        job.worker_id = Some("w1".into());
        job.done_at = Some(chrono::Utc::now());
        store.update_job(&job).await.unwrap();
        // Replaying the same terminal write is harmless.
        store.update_job(&job).await.unwrap();

        let loaded = store.get_job(&job.uuid).await.unwrap();
        assert_eq!(loaded.status, JobStatus::Completed);
        assert_eq!(loaded.worker_id.as_deref(), Some("w1"));
    }

    #[tokio::test]
    async fn jobs_by_status_filters() {
        let store = memory_store().await;
        store
            .create_job(&sample_job("c1", JobStatus::Pending))
            .await
            .unwrap();
        store
            .create_job(&sample_job("c1", JobStatus::Pending))
            .await
            .unwrap();
        store
            .create_job(&sample_job("c1", JobStatus::Dispatched))
            .await
            .unwrap();

        let pending = store.get_jobs_by_status(JobStatus::Pending).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|j| j.status == JobStatus::Pending));

        let failed = store.get_jobs_by_status(JobStatus::Failed).await.unwrap();
        assert!(failed.is_empty());
    }

    #[tokio::test]
    async fn cycle_scoped_count_ignores_other_cycles() {
        let store = memory_store().await;
        store
            .create_job(&sample_job("c1", JobStatus::Pending))
            .await
            .unwrap();
        store
            .create_job(&sample_job("c1", JobStatus::Completed))
            .await
            .unwrap();
        store
            .create_job(&sample_job("c2", JobStatus::Pending))
            .await
            .unwrap();

        let open = store
            .count_cycle_jobs_in("c1", &JobStatus::OPEN)
            .await
            .unwrap();
        assert_eq!(open, 1);
        assert_eq!(store.count_cycle_jobs_in("c1", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn status_column_tracks_updates() {
        let store = memory_store().await;
        let mut job = sample_job("c1", JobStatus::Pending);
        store.create_job(&job).await.unwrap();

        job.status = JobStatus::Dispatched;
        store.update_job(&job).await.unwrap();

        assert!(store
            .get_jobs_by_status(JobStatus::Pending)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .get_jobs_by_status(JobStatus::Dispatched)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn cycle_and_worker_round_trips() {
        let store = memory_store().await;

        let mut cycle = Cycle::start(
            "nightly",
            JobStrategy {
                cycle_duration: 60,
                max_users: 1,
                max_files: 1,
                max_workspaces: 1,
            },
        );
        store.create_cycle(&cycle).await.unwrap();
        cycle.complete().unwrap();
        store.update_cycle(&cycle).await.unwrap();
        let loaded = store.get_cycle(&cycle.uuid).await.unwrap();
        assert!(loaded.done_at.is_some());

        let worker = Worker::new("w1", "W").with_capabilities(vec!["x".into()]);
        store.create_worker(&worker).await.unwrap();
        assert_eq!(store.get_worker("w1").await.unwrap(), worker);
        store.delete_worker("w1").await.unwrap();
    }

    #[tokio::test]
    async fn generated_entities_round_trip() {
        let store = memory_store().await;

        let user = User {
            uuid: faena_core::new_uuid(),
            display_name: "mü stern".into(),
            username: "abc123".into(),
            language: "ge".into(),
            cycle_uuid: "c1".into(),
            session_id: "abc123".into(),
        };
        store.create_user(&user).await.unwrap();
        assert_eq!(store.get_user(&user.uuid).await.unwrap(), user);

        let workspace = Workspace {
            uuid: faena_core::new_uuid(),
            name: "wsp".into(),
            members: vec![user.uuid.clone()],
            cycle_uuid: "c1".into(),
            session_id: "abc123".into(),
        };
        store.create_workspace(&workspace).await.unwrap();
        assert_eq!(
            store.get_workspace(&workspace.uuid).await.unwrap(),
            workspace
        );
    }
}
