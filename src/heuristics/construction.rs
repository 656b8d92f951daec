//! Construction heuristics.
//!
//! Build a tour of a target size from one start point, or complete a partial
//! tour. Every insertion cost counts the point's weight.

use crate::instance::Instance;
use crate::solution::Tour;
use ordered_float::OrderedFloat;

/// Builds tours from scratch or completes partial ones
pub trait ConstructionHeuristic {
    /// Tour of `target` points grown from `start`
    fn construct(&self, instance: &Instance, start: usize, target: usize) -> Tour;
    /// Grow `partial` to `target` points, keeping the points it already has
    fn repair(&self, instance: &Instance, partial: Tour, target: usize) -> Tour;
    fn name(&self) -> &str;
}

/// Cost of inserting `point` between `tour[pos]` and its successor, weight included
fn insertion_cost(instance: &Instance, tour: &[usize], point: usize, pos: usize) -> i64 {
    let prev = tour[pos];
    let next = tour[(pos + 1) % tour.len()];
    instance.distance(prev, point) + instance.distance(point, next) - instance.distance(prev, next)
        + instance.weight(point)
}

fn cheapest_insertion(instance: &Instance, tour: &[usize], point: usize) -> (i64, usize) {
    (0..tour.len())
        .map(|pos| (insertion_cost(instance, tour, point, pos), pos))
        .min()
        .unwrap_or((instance.weight(point), 0))
}

fn unvisited(instance: &Instance, tour: &[usize]) -> Vec<bool> {
    let mut free = vec![true; instance.len()];
    for &p in tour {
        free[p] = false;
    }
    free
}

/// Nearest Neighbor Heuristic
///
/// Appends the unvisited point minimizing distance from the last point plus its weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighbor;

impl ConstructionHeuristic for NearestNeighbor {
    fn construct(&self, instance: &Instance, start: usize, target: usize) -> Tour {
        if target == 0 {
            return Vec::new();
        }
        self.repair(instance, vec![start], target)
    }

    fn repair(&self, instance: &Instance, mut tour: Tour, target: usize) -> Tour {
        let target = target.min(instance.len());
        let mut free = unvisited(instance, &tour);

        if tour.is_empty() && target > 0 {
            tour.push(0);
            free[0] = false;
        }

        while tour.len() < target {
            let Some(&current) = tour.last() else { break };
            let next = (0..instance.len())
                .filter(|&j| free[j])
                .min_by_key(|&j| (instance.distance(current, j) + instance.weight(j), j));
            match next {
                Some(j) => {
                    tour.push(j);
                    free[j] = false;
                }
                None => break,
            }
        }
        tour
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}

/// Greedy Cycle Heuristic
///
/// Repeatedly inserts the point with the cheapest insertion (distance increase
/// plus weight) at its best position. Starting from a single point this first
/// picks that point's cheapest partner.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyCycle;

impl ConstructionHeuristic for GreedyCycle {
    fn construct(&self, instance: &Instance, start: usize, target: usize) -> Tour {
        if target == 0 {
            return Vec::new();
        }
        self.repair(instance, vec![start], target)
    }

    fn repair(&self, instance: &Instance, mut tour: Tour, target: usize) -> Tour {
        let target = target.min(instance.len());
        let mut free = unvisited(instance, &tour);

        if tour.is_empty() && target > 0 {
            tour.push(0);
            free[0] = false;
        }

        while tour.len() < target {
            let best = (0..instance.len())
                .filter(|&p| free[p])
                .map(|p| {
                    let (cost, pos) = cheapest_insertion(instance, &tour, p);
                    (cost, p, pos)
                })
                .min();

            match best {
                Some((_, point, pos)) => {
                    tour.insert(pos + 1, point);
                    free[point] = false;
                }
                None => break,
            }
        }
        tour
    }

    fn name(&self) -> &str {
        "GreedyCycle"
    }
}

/// Weighted 2-Regret Insertion Heuristic
///
/// Scores each point by `regret_weight * (second best - best insertion)
/// - cost_weight * best insertion` and inserts the highest-scoring one.
#[derive(Debug, Clone, Copy)]
pub struct RegretInsertion {
    pub regret_weight: f64,
    pub cost_weight: f64,
}

impl RegretInsertion {
    pub fn new() -> Self {
        RegretInsertion {
            regret_weight: 1.0,
            cost_weight: 1.0,
        }
    }

    /// Weights summing to 2, the first one given
    pub fn with_regret_weight(regret_weight: f64) -> Self {
        RegretInsertion {
            regret_weight,
            cost_weight: 2.0 - regret_weight,
        }
    }

    fn score(&self, instance: &Instance, tour: &[usize], point: usize) -> (f64, usize) {
        let mut costs: Vec<(i64, usize)> = (0..tour.len())
            .map(|pos| (insertion_cost(instance, tour, point, pos), pos))
            .collect();
        costs.sort();

        let (best, pos) = costs[0];
        let second = costs.get(1).map_or(best, |&(c, _)| c);
        let score = self.regret_weight * (second - best) as f64 - self.cost_weight * best as f64;
        (score, pos)
    }
}

impl Default for RegretInsertion {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for RegretInsertion {
    fn construct(&self, instance: &Instance, start: usize, target: usize) -> Tour {
        if target == 0 {
            return Vec::new();
        }
        self.repair(instance, vec![start], target)
    }

    fn repair(&self, instance: &Instance, mut tour: Tour, target: usize) -> Tour {
        let target = target.min(instance.len());
        let mut free = unvisited(instance, &tour);

        if tour.is_empty() && target > 0 {
            tour.push(0);
            free[0] = false;
        }

        while tour.len() < target {
            let best = (0..instance.len())
                .filter(|&p| free[p])
                .map(|p| {
                    let (score, pos) = self.score(instance, &tour, p);
                    (OrderedFloat(score), p, pos)
                })
                .max_by_key(|&(score, p, _)| (score, std::cmp::Reverse(p)));

            match best {
                Some((_, point, pos)) => {
                    tour.insert(pos + 1, point);
                    free[point] = false;
                }
                None => break,
            }
        }
        tour
    }

    fn name(&self) -> &str {
        "Regret-2"
    }
}
