//! Streaming synthetic-entity generator.
//!
//! Three background producers fabricate users, files and workspaces
//! according to the configured probability strategies and push them
//! into bounded channels; consumers pull one entity at a time. All
//! entropy flows from a single seed fixed at construction, so runs
//! are reproducible when a seed is supplied.

pub mod content;
pub mod draw;
pub mod emit;
pub mod names;

use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use faena_core::{DomainError, File, GeneratorSettings, User, Workspace};

/// Workspaces sample members from the most recent user uuids; the
/// pool is bounded so it cannot grow with the run.
const RECENT_USER_POOL: usize = 256;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid strategy: {0}")]
    InvalidStrategy(#[from] DomainError),

    #[error("content write failed: {0}")]
    Io(#[from] std::io::Error),
}

struct ProducerSenders {
    users: mpsc::Sender<User>,
    files: mpsc::Sender<File>,
    workspaces: mpsc::Sender<Workspace>,
}

/// Strategy-driven entity streams.
pub struct Generator {
    settings: GeneratorSettings,
    repository_path: PathBuf,
    seed: u64,
    token: CancellationToken,
    // Consumed by start(); once the producers exit, the senders drop
    // and the streams close.
    senders: StdMutex<Option<ProducerSenders>>,
    users: Mutex<mpsc::Receiver<User>>,
    files: Mutex<mpsc::Receiver<File>>,
    workspaces: Mutex<mpsc::Receiver<Workspace>>,
    recent_users: Arc<StdMutex<Vec<String>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Generator {
    /// Validate the strategies and set up the channels. Producers do
    /// not run until [`Generator::start`].
    ///
    /// `seed` pins the entropy source for reproducible runs; `None`
    /// seeds from the OS.
    pub fn new(
        settings: GeneratorSettings,
        repository_path: PathBuf,
        token: CancellationToken,
        seed: Option<u64>,
    ) -> Result<Self, GeneratorError> {
        settings.validate()?;

        let (user_tx, user_rx) = mpsc::channel(settings.user_buffer);
        let (file_tx, file_rx) = mpsc::channel(settings.file_buffer);
        let (workspace_tx, workspace_rx) = mpsc::channel(settings.workspace_buffer);

        Ok(Self {
            settings,
            repository_path,
            seed: seed.unwrap_or_else(rand::random),
            token,
            senders: StdMutex::new(Some(ProducerSenders {
                users: user_tx,
                files: file_tx,
                workspaces: workspace_tx,
            })),
            users: Mutex::new(user_rx),
            files: Mutex::new(file_rx),
            workspaces: Mutex::new(workspace_rx),
            recent_users: Arc::new(StdMutex::new(Vec::new())),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Spawn the three producers. A second call is a no-op.
    pub async fn start(&self) {
        let Some(senders) = self.senders.lock().expect("sender slot poisoned").take() else {
            return;
        };
        let mut tasks = self.tasks.lock().await;

        let strategy = self.settings.strategy.user_strategy.clone();
        let tx = senders.users;
        let pool = Arc::clone(&self.recent_users);
        let token = self.token.clone();
        let mut rng = StdRng::seed_from_u64(self.seed);
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    permit = tx.reserve() => {
                        let Ok(permit) = permit else { break };
                        let user = emit::user(&strategy, &mut rng);
                        {
                            let mut pool = pool.lock().expect("user pool poisoned");
                            if pool.len() == RECENT_USER_POOL {
                                pool.remove(0);
                            }
                            pool.push(user.uuid.clone());
                        }
                        permit.send(user);
                    }
                }
            }
            debug!("user producer stopped");
        }));

        let strategy = self.settings.strategy.file_strategy.clone();
        let tx = senders.files;
        let repository = self.repository_path.clone();
        let token = self.token.clone();
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(1));
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    permit = tx.reserve() => {
                        let Ok(permit) = permit else { break };
                        match emit::file(&strategy, &repository, &mut rng).await {
                            Ok(file) => permit.send(file),
                            Err(e) => warn!(error = %e, "file generation failed"),
                        }
                    }
                }
            }
            debug!("file producer stopped");
        }));

        let strategy = self.settings.strategy.workspace_strategy.clone();
        let tx = senders.workspaces;
        let pool = Arc::clone(&self.recent_users);
        let token = self.token.clone();
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(2));
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    permit = tx.reserve() => {
                        let Ok(permit) = permit else { break };
                        let available = pool.lock().expect("user pool poisoned").clone();
                        if available.is_empty() {
                            // No users generated yet; try again shortly.
                            drop(permit);
                            tokio::select! {
                                _ = token.cancelled() => break,
                                _ = tokio::time::sleep(Duration::from_millis(50)) => continue,
                            }
                        }
                        permit.send(emit::workspace(&strategy, &available, &mut rng));
                    }
                }
            }
            debug!("workspace producer stopped");
        }));
    }

    /// Cancel the producers and wait for them to drain.
    pub async fn stop(&self) {
        self.token.cancel();
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
    }

    pub async fn next_user(&self) -> Option<User> {
        self.users.lock().await.recv().await
    }

    pub async fn next_file(&self) -> Option<File> {
        self.files.lock().await.recv().await
    }

    pub async fn next_workspace(&self) -> Option<Workspace> {
        self.workspaces.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faena_core::{FileStrategy, Strategy, UserStrategy, WorkspaceStrategy};

    fn settings() -> GeneratorSettings {
        GeneratorSettings {
            strategy: Strategy {
                file_strategy: FileStrategy {
                    file_extension: vec!["txt".into()],
                    file_extension_probability: vec![1.0],
                    file_size: vec![1024],
                    file_size_probability: vec![1.0],
                    file_name_lang: vec!["en".into()],
                    file_name_probability: vec![1.0],
                },
                user_strategy: UserStrategy {
                    user_lang: vec!["en".into()],
                    lang_probability: vec![1.0],
                },
                workspace_strategy: WorkspaceStrategy {
                    number_of_users: vec![2],
                    number_of_users_probability: vec![1.0],
                },
            },
            file_buffer: 2,
            user_buffer: 4,
            workspace_buffer: 2,
        }
    }

    #[tokio::test]
    async fn streams_all_three_entity_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(
            settings(),
            dir.path().to_path_buf(),
            CancellationToken::new(),
            Some(99),
        )
        .unwrap();
        generator.start().await;

        let user = generator.next_user().await.unwrap();
        assert!(!user.username.is_empty());

        let file = generator.next_file().await.unwrap();
        assert!(std::path::Path::new(&file.content_path).exists());

        let workspace = generator.next_workspace().await.unwrap();
        assert!(workspace.members.len() <= 2);

        generator.stop().await;
    }

    #[tokio::test]
    async fn invalid_strategy_is_rejected_up_front() {
        let mut bad = settings();
        bad.strategy.user_strategy.lang_probability.clear();
        let result = Generator::new(
            bad,
            std::env::temp_dir(),
            CancellationToken::new(),
            None,
        );
        assert!(matches!(result, Err(GeneratorError::InvalidStrategy(_))));
    }

    #[tokio::test]
    async fn stop_halts_producers() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(
            settings(),
            dir.path().to_path_buf(),
            CancellationToken::new(),
            Some(7),
        )
        .unwrap();
        generator.start().await;
        let _ = generator.next_user().await;
        generator.stop().await;
        // Producers are gone; the channel drains whatever was
        // buffered and then closes.
        while generator.next_user().await.is_some() {}
    }

    #[tokio::test]
    async fn seeded_runs_are_reproducible() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let a = Generator::new(
            settings(),
            dir_a.path().to_path_buf(),
            CancellationToken::new(),
            Some(1234),
        )
        .unwrap();
        let b = Generator::new(
            settings(),
            dir_b.path().to_path_buf(),
            CancellationToken::new(),
            Some(1234),
        )
        .unwrap();
        a.start().await;
        b.start().await;

        let ua = a.next_user().await.unwrap();
        let ub = b.next_user().await.unwrap();
        assert_eq!(ua.username, ub.username);

        a.stop().await;
        b.stop().await;
    }
}
