//! Probability-table draws.

use rand::Rng;

/// Pick an index from a cumulative probability distribution.
///
/// A draw beyond the distribution's total mass falls through to the
/// last index, so distributions summing below 1.0 stay total.
pub fn pick_index<R: Rng + ?Sized>(probabilities: &[f64], rng: &mut R) -> usize {
    debug_assert!(!probabilities.is_empty());
    let draw: f64 = rng.gen();
    let mut sum = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        sum += p;
        if draw <= sum {
            return i;
        }
    }
    probabilities.len() - 1
}
