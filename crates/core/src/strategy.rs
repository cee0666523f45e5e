//! Generation and job strategies.
//!
//! A strategy pairs a list of candidate values with a probability
//! distribution of the same length. Draws walk the cumulative sum and
//! fall through to the last index when the distribution sums below
//! the drawn value.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

fn check_distribution(
    what: &str,
    keys_len: usize,
    probabilities: &[f64],
) -> Result<(), DomainError> {
    if keys_len == 0 {
        return Err(DomainError::validation(format!("{what}: empty value list")));
    }
    if keys_len != probabilities.len() {
        return Err(DomainError::validation(format!(
            "{what}: {keys_len} values vs {} probabilities",
            probabilities.len()
        )));
    }
    if probabilities.iter().any(|p| !(0.0..=1.0).contains(p)) {
        return Err(DomainError::validation(format!(
            "{what}: probability out of [0, 1]"
        )));
    }
    Ok(())
}

/// Languages used for synthetic user names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStrategy {
    pub user_lang: Vec<String>,
    pub lang_probability: Vec<f64>,
}

impl UserStrategy {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_distribution("user_strategy", self.user_lang.len(), &self.lang_probability)
    }
}

/// Extension, size and name-language distributions for files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStrategy {
    pub file_extension: Vec<String>,
    pub file_extension_probability: Vec<f64>,
    pub file_size: Vec<usize>,
    pub file_size_probability: Vec<f64>,
    pub file_name_lang: Vec<String>,
    pub file_name_probability: Vec<f64>,
}

impl FileStrategy {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_distribution(
            "file_strategy.extension",
            self.file_extension.len(),
            &self.file_extension_probability,
        )?;
        check_distribution(
            "file_strategy.size",
            self.file_size.len(),
            &self.file_size_probability,
        )?;
        check_distribution(
            "file_strategy.name_lang",
            self.file_name_lang.len(),
            &self.file_name_probability,
        )
    }
}

/// Workspace member-count distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceStrategy {
    pub number_of_users: Vec<usize>,
    pub number_of_users_probability: Vec<f64>,
}

impl WorkspaceStrategy {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_distribution(
            "workspace_strategy",
            self.number_of_users.len(),
            &self.number_of_users_probability,
        )
    }
}

/// The three generation strategies together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub file_strategy: FileStrategy,
    pub user_strategy: UserStrategy,
    pub workspace_strategy: WorkspaceStrategy,
}

impl Strategy {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.file_strategy.validate()?;
        self.user_strategy.validate()?;
        self.workspace_strategy.validate()
    }
}

/// Generator section of the configuration: strategies plus the
/// bounded-channel buffer sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    pub strategy: Strategy,
    #[serde(default = "GeneratorSettings::default_file_buffer")]
    pub file_buffer: usize,
    #[serde(default = "GeneratorSettings::default_user_buffer")]
    pub user_buffer: usize,
    #[serde(default = "GeneratorSettings::default_workspace_buffer")]
    pub workspace_buffer: usize,
}

impl GeneratorSettings {
    fn default_file_buffer() -> usize {
        5
    }

    fn default_user_buffer() -> usize {
        10
    }

    fn default_workspace_buffer() -> usize {
        10
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.file_buffer == 0 || self.user_buffer == 0 || self.workspace_buffer == 0 {
            return Err(DomainError::validation("generator buffers must be > 0"));
        }
        self.strategy.validate()
    }
}

/// Shape of one cycle: how many users to drain and how many file and
/// workspace actions each user's session performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStrategy {
    /// Seconds between cycle starts when running continuously.
    pub cycle_duration: u64,
    pub max_users: usize,
    pub max_files: usize,
    #[serde(rename = "max_workspace")]
    pub max_workspaces: usize,
}

impl JobStrategy {
    /// Jobs synthesized per user session.
    pub fn jobs_per_session(&self) -> usize {
        self.max_files + self.max_workspaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_strategy() -> UserStrategy {
        UserStrategy {
            user_lang: vec!["en".into(), "vi".into()],
            lang_probability: vec![0.7, 0.3],
        }
    }

    #[test]
    fn valid_strategy_passes() {
        assert!(user_strategy().validate().is_ok());
    }

    #[test]
    fn length_mismatch_rejected() {
        let mut s = user_strategy();
        s.lang_probability.pop();
        assert!(s.validate().is_err());
    }

    #[test]
    fn empty_values_rejected() {
        let s = WorkspaceStrategy {
            number_of_users: vec![],
            number_of_users_probability: vec![],
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn out_of_range_probability_rejected() {
        let mut s = user_strategy();
        s.lang_probability[0] = 1.5;
        assert!(s.validate().is_err());
    }

    #[test]
    fn job_strategy_uses_original_wire_name() {
        let raw = r#"{"cycle_duration":60,"max_users":2,"max_files":3,"max_workspace":1}"#;
        let s: JobStrategy = serde_json::from_str(raw).unwrap();
        assert_eq!(s.max_workspaces, 1);
        assert_eq!(s.jobs_per_session(), 4);
    }
}
