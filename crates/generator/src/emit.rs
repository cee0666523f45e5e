//! Single-entity emitters: one user, file or workspace per call.
//!
//! Strategies are validated once at generator construction; these
//! functions assume well-formed tables and draw everything from the
//! caller's entropy handle.

use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;

use faena_core::{new_uuid, File, FileStrategy, User, UserStrategy, Workspace, WorkspaceStrategy};

use crate::content;
use crate::draw::pick_index;
use crate::names;
use crate::GeneratorError;

/// Synthesize one user.
pub fn user<R: Rng + ?Sized>(strategy: &UserStrategy, rng: &mut R) -> User {
    let language = strategy.user_lang[pick_index(&strategy.lang_probability, rng)].clone();
    User {
        uuid: new_uuid(),
        display_name: names::phrase(&strategy.user_lang, rng),
        username: names::alphanumeric(rng, 6, 12),
        language,
        cycle_uuid: String::new(),
        session_id: String::new(),
    }
}

/// Synthesize one file and write its payload under `repository`.
pub async fn file<R: Rng + ?Sized>(
    strategy: &FileStrategy,
    repository: &Path,
    rng: &mut R,
) -> Result<File, GeneratorError> {
    let extension =
        strategy.file_extension[pick_index(&strategy.file_extension_probability, rng)].clone();
    let target_size = strategy.file_size[pick_index(&strategy.file_size_probability, rng)];
    let lang = strategy.file_name_lang[pick_index(&strategy.file_name_probability, rng)].clone();

    let name = names::phrase(std::slice::from_ref(&lang), rng);
    let payload = content::fabricate(&extension, &lang, target_size, rng);
    let file_size = payload.len();

    let path = repository.join(format!("{name}.{extension}"));
    tokio::fs::create_dir_all(repository).await?;
    tokio::fs::write(&path, &payload).await?;

    Ok(File {
        uuid: new_uuid(),
        name,
        description: format!("Generated {extension} file in {lang}"),
        file_extension: extension,
        file_size,
        content_path: path.to_string_lossy().into_owned(),
        workspace_id: String::new(),
        cycle_uuid: String::new(),
        session_id: String::new(),
    })
}

/// Synthesize one workspace from the pool of known user uuids.
///
/// The drawn member count is capped at the pool size; sampling is
/// without replacement.
pub fn workspace<R: Rng + ?Sized>(
    strategy: &WorkspaceStrategy,
    available_users: &[String],
    rng: &mut R,
) -> Workspace {
    let drawn =
        strategy.number_of_users[pick_index(&strategy.number_of_users_probability, rng)];
    let count = drawn.min(available_users.len());

    let mut pool = available_users.to_vec();
    pool.shuffle(rng);
    pool.truncate(count);

    Workspace {
        uuid: new_uuid(),
        name: names::alphanumeric(rng, 8, 16),
        members: pool,
        cycle_uuid: String::new(),
        session_id: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn user_strategy() -> UserStrategy {
        UserStrategy {
            user_lang: vec!["en".into(), "cn".into()],
            lang_probability: vec![0.5, 0.5],
        }
    }

    #[test]
    fn user_fields_are_populated() {
        let mut rng = StdRng::seed_from_u64(11);
        let u = user(&user_strategy(), &mut rng);
        assert!(!u.uuid.is_empty());
        assert!((6..=12).contains(&u.username.len()));
        assert!(["en", "cn"].contains(&u.language.as_str()));
        assert!(!u.display_name.is_empty());
    }

    #[test]
    fn same_seed_produces_same_user() {
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        let ua = user(&user_strategy(), &mut a);
        let ub = user(&user_strategy(), &mut b);
        assert_eq!(ua.username, ub.username);
        assert_eq!(ua.display_name, ub.display_name);
    }

    #[tokio::test]
    async fn file_lands_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = FileStrategy {
            file_extension: vec!["txt".into()],
            file_extension_probability: vec![1.0],
            file_size: vec![1024],
            file_size_probability: vec![1.0],
            file_name_lang: vec!["en".into()],
            file_name_probability: vec![1.0],
        };
        let mut rng = StdRng::seed_from_u64(11);

        let f = file(&strategy, dir.path(), &mut rng).await.unwrap();
        assert_eq!(f.file_extension, "txt");
        let written = std::fs::read(&f.content_path).unwrap();
        assert_eq!(written.len(), f.file_size);
    }

    #[test]
    fn workspace_members_bounded_by_pool() {
        let strategy = WorkspaceStrategy {
            number_of_users: vec![5],
            number_of_users_probability: vec![1.0],
        };
        let mut rng = StdRng::seed_from_u64(11);
        let pool = vec!["a".to_string(), "b".to_string()];

        let w = workspace(&strategy, &pool, &mut rng);
        assert_eq!(w.members.len(), 2);
        assert!((8..=16).contains(&w.name.len()));

        let mut sorted = w.members.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), w.members.len());
    }

    #[test]
    fn workspace_from_empty_pool_has_no_members() {
        let strategy = WorkspaceStrategy {
            number_of_users: vec![3],
            number_of_users_probability: vec![1.0],
        };
        let mut rng = StdRng::seed_from_u64(11);
        let w = workspace(&strategy, &[], &mut rng);
        assert!(w.members.is_empty());
    }
}
