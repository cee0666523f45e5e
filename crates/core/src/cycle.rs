//! Cycle aggregate and the per-user session scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::strategy::JobStrategy;

/// Status of a workload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    Running,
    Completed,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Running => "running",
            CycleStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bounded run of synthetic workload with a fixed strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub uuid: String,
    pub name: String,
    pub strategy: JobStrategy,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
    pub status: CycleStatus,
}

impl Cycle {
    /// Open a new running cycle with a fresh uuid.
    pub fn start(name: impl Into<String>, strategy: JobStrategy) -> Self {
        Self {
            uuid: crate::new_uuid(),
            name: name.into(),
            strategy,
            started_at: Utc::now(),
            done_at: None,
            status: CycleStatus::Running,
        }
    }

    /// Terminal transition. `done_at` is set exactly when the status
    /// flips to completed.
    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.status == CycleStatus::Completed {
            return Err(DomainError::validation("cycle already completed"));
        }
        self.status = CycleStatus::Completed;
        self.done_at = Some(Utc::now());
        Ok(())
    }
}

/// Per-user scope within a cycle. Never persisted on its own; jobs
/// carry the `user_id` by value as their `session_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> JobStrategy {
        JobStrategy {
            cycle_duration: 60,
            max_users: 2,
            max_files: 3,
            max_workspaces: 1,
        }
    }

    #[test]
    fn start_opens_running_cycle() {
        let cycle = Cycle::start("nightly", strategy());
        assert_eq!(cycle.status, CycleStatus::Running);
        assert!(cycle.done_at.is_none());
    }

    #[test]
    fn complete_sets_done_at_once() {
        let mut cycle = Cycle::start("nightly", strategy());
        cycle.complete().unwrap();
        assert_eq!(cycle.status, CycleStatus::Completed);
        assert!(cycle.done_at.unwrap() >= cycle.started_at);
        assert!(cycle.complete().is_err());
    }

    #[test]
    fn cycle_status_wire_literals() {
        assert_eq!(
            serde_json::to_string(&CycleStatus::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(
            serde_json::to_string(&CycleStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
