//! Random source shared by the search components.
//!
//! A single generator is threaded explicitly through every component that
//! needs randomness; reseeding only happens where a wrapper asks for it.

use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::solution::Tour;

/// Generator used for every search run
pub type SearchRng = ChaCha8Rng;

/// Distance between the seeds of two consecutive multi-start repeats
pub const SEED_SPREAD: u64 = 1000;

pub fn seeded_rng(seed: u64) -> SearchRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `0..size` in random order
pub fn shuffled_indices(size: usize, rng: &mut SearchRng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..size).collect();
    indices.shuffle(rng);
    indices
}

/// Random tour of `size` distinct points drawn from `0..point_count`
pub fn random_tour(point_count: usize, size: usize, rng: &mut SearchRng) -> Tour {
    let mut tour = shuffled_indices(point_count, rng);
    tour.truncate(size);
    tour
}

/// Draw `count` distinct indices, each with probability proportional to its weight.
///
/// A chosen index has its weight zeroed so it cannot come up again. Negative
/// weights count as zero; once every remaining weight is zero the rest are
/// drawn uniformly among the indices not chosen yet.
pub fn sample_weighted_without_replacement(weights: &[i64], count: usize, rng: &mut SearchRng) -> Vec<usize> {
    let count = count.min(weights.len());
    let mut remaining: Vec<u64> = weights.iter().map(|&w| w.max(0) as u64).collect();
    let mut chosen = Vec::with_capacity(count);
    let mut taken = vec![false; weights.len()];

    while chosen.len() < count {
        let idx = match WeightedIndex::new(&remaining) {
            Ok(dist) => dist.sample(rng),
            Err(_) => {
                let free: Vec<usize> = (0..weights.len()).filter(|&i| !taken[i]).collect();
                free[rng.gen_range(0..free.len())]
            }
        };
        taken[idx] = true;
        remaining[idx] = 0;
        chosen.push(idx);
    }

    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_shuffled_indices_is_permutation() {
        let mut rng = seeded_rng(7);
        let mut indices = shuffled_indices(50, &mut rng);
        indices.sort();
        assert_eq!(indices, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = random_tour(30, 10, &mut seeded_rng(3));
        let b = random_tour(30, 10, &mut seeded_rng(3));
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert_eq!(a.iter().collect::<HashSet<_>>().len(), 10);
    }

    #[test]
    fn test_weighted_sampling_skips_zero_weights_until_exhausted() {
        let mut rng = seeded_rng(11);
        for _ in 0..20 {
            let picked = sample_weighted_without_replacement(&[0, 5, 0, 9, -3], 2, &mut rng);
            let set: HashSet<usize> = picked.iter().copied().collect();
            assert_eq!(set, HashSet::from([1, 3]));
        }
    }

    #[test]
    fn test_weighted_sampling_falls_back_to_uniform() {
        let mut rng = seeded_rng(5);
        let picked = sample_weighted_without_replacement(&[0, 4, 0, 0], 4, &mut rng);
        assert_eq!(picked[0], 1);
        let set: HashSet<usize> = picked.iter().copied().collect();
        assert_eq!(set.len(), 4);
    }
}
