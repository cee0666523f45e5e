//! Worker selection policies.

use rand::seq::SliceRandom;

use faena_core::Worker;

/// Chooses the target worker for a dispatch out of a registry
/// snapshot.
pub trait SelectionPolicy: Send + Sync {
    fn select<'a>(&self, snapshot: &'a [Worker]) -> Option<&'a Worker>;
}

/// Uniform random selection over the live set.
#[derive(Debug, Default)]
pub struct RandomPolicy;

impl SelectionPolicy for RandomPolicy {
    fn select<'a>(&self, snapshot: &'a [Worker]) -> Option<&'a Worker> {
        snapshot.choose(&mut rand::thread_rng())
    }
}
