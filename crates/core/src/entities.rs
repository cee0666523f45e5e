//! Generated entities referenced by jobs: users, files, workspaces.

use serde::{Deserialize, Serialize};

/// A synthetic user streamed by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: String,
    pub display_name: String,
    pub username: String,
    pub language: String,
    #[serde(default)]
    pub cycle_uuid: String,
    #[serde(default)]
    pub session_id: String,
}

/// A synthetic file; `content_path` points at the fabricated payload
/// under the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub uuid: String,
    pub name: String,
    pub description: String,
    pub file_extension: String,
    pub file_size: usize,
    pub content_path: String,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub cycle_uuid: String,
    #[serde(default)]
    pub session_id: String,
}

/// A synthetic workspace holding a sampled set of user uuids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub uuid: String,
    pub name: String,
    pub members: Vec<String>,
    #[serde(default)]
    pub cycle_uuid: String,
    #[serde(default)]
    pub session_id: String,
}
