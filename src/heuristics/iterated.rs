//! Iterated local search.

use crate::error::Result;
use crate::heuristics::local_search::Improver;
use crate::instance::Instance;
use crate::random::SearchRng;
use crate::solution::{points_outside, replace_node, swap_edges, Solution, Tour};
use rand::Rng;
use std::time::{Duration, Instant};

/// Iterated Local Search
///
/// Perturbs the incumbent, re-optimizes it with the inner search and keeps it
/// only when it is strictly better than the incumbent. The best tour seen is
/// tracked on its own.
pub struct IteratedLocalSearch {
    pub inner: Box<dyn Improver>,
    /// Number of random edits per perturbation
    pub perturbation_size: usize,
    pub time_limit: Duration,
}

impl IteratedLocalSearch {
    pub fn new(inner: Box<dyn Improver>, perturbation_size: usize, time_limit: Duration) -> Self {
        IteratedLocalSearch {
            inner,
            perturbation_size,
            time_limit,
        }
    }

    /// Random replacements with outside points mixed with random 2-opt moves
    pub fn perturb(&self, instance: &Instance, tour: &mut Tour, rng: &mut SearchRng) {
        let n = tour.len();
        if n == 0 {
            return;
        }
        for _ in 0..self.perturbation_size {
            if rng.gen_bool(0.5) {
                let outside = points_outside(tour, instance.len());
                if outside.is_empty() {
                    continue;
                }
                let pos = rng.gen_range(0..n);
                let point = outside[rng.gen_range(0..outside.len())];
                replace_node(tour, pos, point);
            } else {
                let first = rng.gen_range(0..n);
                let second = rng.gen_range(0..n);
                swap_edges(tour, first, second);
            }
        }
    }
}

impl Improver for IteratedLocalSearch {
    fn improve(&self, instance: &Instance, solution: &mut Solution, rng: &mut SearchRng) -> Result<bool> {
        let start = Instant::now();
        solution.evaluate(instance);
        let initial = solution.score;

        let mut incumbent = solution.clone();
        let mut best = solution.clone();
        let mut iterations = 0;

        while start.elapsed() < self.time_limit {
            let mut perturbed = incumbent.tour.clone();
            self.perturb(instance, &mut perturbed, rng);

            let mut candidate = Solution::from_tour(instance, perturbed, self.name());
            self.inner.improve(instance, &mut candidate, rng)?;
            iterations += 1;

            log::debug!("ILS round {}: candidate {} incumbent {}", iterations, candidate.score, incumbent.score);
            if candidate.score < best.score {
                log::info!("ILS new best {} after {} rounds", candidate.score, iterations);
                best = candidate.clone();
            }
            if candidate.score < incumbent.score {
                incumbent = candidate;
            }
        }

        debug_assert_eq!(best.score, incumbent.score);
        solution.tour = best.tour;
        solution.score = best.score;
        solution.iterations = Some(iterations);
        Ok(solution.score < initial)
    }

    fn name(&self) -> &str {
        "IteratedLocalSearch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::local_search::{GreedySearch, SteepestSearch};
    use crate::heuristics::neighborhood::NeighborhoodScope;
    use crate::instance::tests_support::scattered_instance;
    use crate::random::{random_tour, seeded_rng};
    use crate::solution::evaluate;
    use std::collections::HashSet;

    #[test]
    fn test_perturb_keeps_tour_valid() {
        let instance = scattered_instance(20);
        let search = IteratedLocalSearch::new(Box::new(GreedySearch::default()), 8, Duration::ZERO);
        let mut rng = seeded_rng(3);
        let mut tour = random_tour(20, 10, &mut rng);

        for _ in 0..50 {
            search.perturb(&instance, &mut tour, &mut rng);
            let unique: HashSet<usize> = tour.iter().copied().collect();
            assert_eq!(unique.len(), 10);
        }
    }

    #[test]
    fn test_ils_improves_and_counts_rounds() {
        let instance = scattered_instance(30);
        let search = IteratedLocalSearch::new(
            Box::new(SteepestSearch::new(NeighborhoodScope::Edge)),
            3,
            Duration::from_millis(40),
        );
        let mut rng = seeded_rng(5);
        let mut solution = Solution::from_tour(&instance, random_tour(30, 15, &mut rng), "test");
        let start = solution.score;

        let improved = search.improve(&instance, &mut solution, &mut rng).unwrap();

        assert!(improved);
        assert!(solution.score < start);
        assert!(solution.is_valid(&instance));
        assert_eq!(solution.tour.len(), 15);
        assert_eq!(solution.score, evaluate(&instance, &solution.tour));
        assert!(solution.iterations.unwrap() >= 1);
    }

    #[test]
    fn test_strict_acceptance_keeps_incumbent_and_best_together() {
        // With strict acceptance the incumbent only moves on a new best, so
        // the returned best must equal what the incumbent ended on.
        let instance = scattered_instance(24);
        let inner = SteepestSearch::new(NeighborhoodScope::Both);
        let search = IteratedLocalSearch::new(Box::new(inner), 2, Duration::from_millis(30));
        let mut rng = seeded_rng(8);
        let mut solution = Solution::from_tour(&instance, random_tour(24, 12, &mut rng), "test");
        SteepestSearch::new(NeighborhoodScope::Both)
            .improve(&instance, &mut solution, &mut rng)
            .unwrap();
        let local_optimum = solution.score;

        search.improve(&instance, &mut solution, &mut rng).unwrap();
        assert!(solution.score <= local_optimum);

        // No local-search pass can improve what ILS returned
        let mut again = solution.clone();
        let improved = SteepestSearch::new(NeighborhoodScope::Both)
            .improve(&instance, &mut again, &mut rng)
            .unwrap();
        assert!(!improved);
    }

    #[test]
    fn test_zero_budget_returns_input() {
        let instance = scattered_instance(10);
        let search = IteratedLocalSearch::new(Box::new(GreedySearch::default()), 2, Duration::ZERO);
        let tour = vec![0, 1, 2, 3, 4];
        let mut solution = Solution::from_tour(&instance, tour.clone(), "test");

        let improved = search.improve(&instance, &mut solution, &mut seeded_rng(0)).unwrap();

        assert!(!improved);
        assert_eq!(solution.tour, tour);
        assert_eq!(solution.iterations, Some(0));
    }
}
