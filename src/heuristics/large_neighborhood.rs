//! Large neighborhood search: weighted destroy, greedy repair.

use crate::error::Result;
use crate::heuristics::construction::{ConstructionHeuristic, GreedyCycle};
use crate::heuristics::local_search::Improver;
use crate::instance::Instance;
use crate::random::{sample_weighted_without_replacement, SearchRng};
use crate::solution::{Solution, Tour};
use std::time::{Duration, Instant};

/// Large Neighborhood Search
///
/// Each round removes `removal_size` positions, favouring the points that
/// cost the most where they sit, rebuilds the tour with greedy-cycle
/// insertion and optionally runs the inner search on it.
pub struct LargeNeighborhoodSearch {
    pub inner: Option<Box<dyn Improver>>,
    pub removal_size: usize,
    pub time_limit: Duration,
}

impl LargeNeighborhoodSearch {
    pub fn new(inner: Option<Box<dyn Improver>>, removal_size: usize, time_limit: Duration) -> Self {
        LargeNeighborhoodSearch {
            inner,
            removal_size,
            time_limit,
        }
    }

    /// Weight of each position: the point's weight plus its two tour edges
    pub fn removal_costs(instance: &Instance, tour: &[usize]) -> Vec<i64> {
        let n = tour.len();
        (0..n)
            .map(|i| {
                let point = tour[i];
                instance.weight(point)
                    + instance.distance(point, tour[(i + n - 1) % n])
                    + instance.distance(point, tour[(i + 1) % n])
            })
            .collect()
    }

    /// Remove a weighted random subset of positions, keeping the order of the rest
    pub fn destroy(&self, instance: &Instance, tour: &[usize], rng: &mut SearchRng) -> Tour {
        let costs = Self::removal_costs(instance, tour);
        let mut removed = vec![false; tour.len()];
        for idx in sample_weighted_without_replacement(&costs, self.removal_size, rng) {
            removed[idx] = true;
        }
        tour.iter()
            .zip(removed)
            .filter(|(_, gone)| !gone)
            .map(|(&p, _)| p)
            .collect()
    }
}

impl Improver for LargeNeighborhoodSearch {
    fn improve(&self, instance: &Instance, solution: &mut Solution, rng: &mut SearchRng) -> Result<bool> {
        let start = Instant::now();
        let target = solution.tour.len();
        solution.evaluate(instance);
        let initial = solution.score;

        let mut working = solution.clone();
        let mut best = solution.clone();
        let mut iterations = 0;

        while start.elapsed() < self.time_limit {
            let partial = self.destroy(instance, &working.tour, rng);
            let repaired = GreedyCycle.repair(instance, partial, target);
            let mut candidate = Solution::from_tour(instance, repaired, self.name());

            if let Some(inner) = &self.inner {
                inner.improve(instance, &mut candidate, rng)?;
            }
            iterations += 1;

            log::debug!("LNS round {}: candidate {} working {}", iterations, candidate.score, working.score);
            if candidate.score < best.score {
                log::info!("LNS new best {} after {} rounds", candidate.score, iterations);
                best = candidate.clone();
            }
            if candidate.score < working.score {
                working = candidate;
            }
        }

        solution.tour = best.tour;
        solution.score = best.score;
        solution.iterations = Some(iterations);
        Ok(solution.score < initial)
    }

    fn name(&self) -> &str {
        "LargeNeighborhoodSearch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::local_search::SteepestSearch;
    use crate::heuristics::neighborhood::NeighborhoodScope;
    use crate::instance::tests_support::{delta_instance, scattered_instance};
    use crate::random::{random_tour, seeded_rng};
    use crate::solution::evaluate;

    #[test]
    fn test_removal_costs() {
        let instance = delta_instance();
        // Point 1: weight 12, d(0,1) = 3, d(1,2) = 3
        let costs = LargeNeighborhoodSearch::removal_costs(&instance, &[0, 1, 2]);
        assert_eq!(costs[1], 18);
        assert_eq!(costs.len(), 3);
    }

    #[test]
    fn test_destroy_removes_exactly_d_positions() {
        let instance = scattered_instance(30);
        let search = LargeNeighborhoodSearch::new(None, 4, Duration::ZERO);
        let mut rng = seeded_rng(2);
        let tour = random_tour(30, 15, &mut rng);

        let partial = search.destroy(&instance, &tour, &mut rng);

        assert_eq!(partial.len(), 11);
        // Survivors keep their relative order
        let positions: Vec<usize> = partial
            .iter()
            .map(|p| tour.iter().position(|q| q == p).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_lns_with_and_without_inner_search() {
        let instance = scattered_instance(30);
        for inner in [None, Some(Box::new(SteepestSearch::new(NeighborhoodScope::Edge)) as Box<dyn Improver>)] {
            let search = LargeNeighborhoodSearch::new(inner, 5, Duration::from_millis(30));
            let mut rng = seeded_rng(11);
            let mut solution = Solution::from_tour(&instance, random_tour(30, 15, &mut rng), "test");
            let start = solution.score;

            search.improve(&instance, &mut solution, &mut rng).unwrap();

            assert!(solution.score <= start);
            assert!(solution.is_valid(&instance));
            assert_eq!(solution.tour.len(), 15);
            assert_eq!(solution.score, evaluate(&instance, &solution.tour));
        }
    }
}
