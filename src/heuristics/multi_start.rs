//! Multi-start local search.

use crate::error::Result;
use crate::heuristics::local_search::Improver;
use crate::instance::Instance;
use crate::random::{random_tour, seeded_rng, SearchRng, SEED_SPREAD};
use crate::solution::Solution;
use std::time::{Duration, Instant};

/// Runs the inner search from `repeats` random tours and keeps the best result
///
/// Only the size of the incoming tour is used. Each repeat reseeds the
/// generator with `seed + repeat * SEED_SPREAD` (wrapping), so a run is reproducible
/// repeat by repeat.
pub struct MultiStart {
    pub inner: Box<dyn Improver>,
    pub repeats: usize,
    pub seed: u64,
    pub time_limit: Option<Duration>,
}

impl MultiStart {
    pub fn new(inner: Box<dyn Improver>, repeats: usize, seed: u64) -> Self {
        MultiStart {
            inner,
            repeats,
            seed,
            time_limit: None,
        }
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

impl Improver for MultiStart {
    fn improve(&self, instance: &Instance, solution: &mut Solution, rng: &mut SearchRng) -> Result<bool> {
        let start = Instant::now();
        let target = solution.tour.len();
        solution.evaluate(instance);
        let initial = solution.score;
        let mut best: Option<Solution> = None;
        let mut repeats_done = 0;

        for repeat in 0..self.repeats {
            if let Some(limit) = self.time_limit {
                if repeat > 0 && start.elapsed() >= limit {
                    break;
                }
            }

            *rng = seeded_rng(self.seed.wrapping_add((repeat as u64).wrapping_mul(SEED_SPREAD)));
            let tour = random_tour(instance.len(), target, rng);
            let mut candidate = Solution::from_tour(instance, tour, self.name());
            self.inner.improve(instance, &mut candidate, rng)?;
            repeats_done += 1;

            log::debug!("multi-start repeat {}: score {}", repeat, candidate.score);
            if best.as_ref().map_or(true, |b| candidate.score < b.score) {
                best = Some(candidate);
            }
        }

        if let Some(best) = best {
            solution.tour = best.tour;
            solution.score = best.score;
        }
        solution.iterations = Some(repeats_done);
        Ok(solution.score < initial)
    }

    fn name(&self) -> &str {
        "MultiStart"
    }
}
