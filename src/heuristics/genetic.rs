//! Genetic local search.
//!
//! A steady-state population of locally optimal tours:
//! - Members are kept sorted by ascending score, and no two share a score
//! - Each generation recombines two random members into one child
//! - The child replaces the worst member when it is better and new
//!
//! Two recombination operators are available: shared-edge segments
//! ([`Crossover::EdgeRecombination`]) and a per-position lighter-point pick
//! ([`Crossover::WeightPreference`]). Both close the child with greedy-cycle
//! insertion.

use crate::error::Result;
use crate::heuristics::construction::{ConstructionHeuristic, GreedyCycle};
use crate::heuristics::local_search::{Improver, LazySteepestSearch};
use crate::heuristics::neighborhood::NeighborhoodScope;
use crate::instance::Instance;
use crate::random::{random_tour, SearchRng};
use crate::solution::{evaluate, Solution, Tour};
use rand::seq::{index, SliceRandom};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Individual in the population
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Individual {
    pub tour: Tour,
    pub score: i64,
}

impl Individual {
    pub fn new(instance: &Instance, tour: Tour) -> Self {
        let score = evaluate(instance, &tour);
        Individual { tour, score }
    }
}

/// Sorted, score-unique set of individuals
#[derive(Debug, Clone, Default)]
pub struct Population {
    members: Vec<Individual>,
}

impl Population {
    pub fn new() -> Self {
        Population { members: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Individual] {
        &self.members
    }

    pub fn best(&self) -> Option<&Individual> {
        self.members.first()
    }

    pub fn worst(&self) -> Option<&Individual> {
        self.members.last()
    }

    pub fn contains_score(&self, score: i64) -> bool {
        self.members.binary_search_by_key(&score, |m| m.score).is_ok()
    }

    /// Add a member if its score is new. Returns whether it was added.
    pub fn insert(&mut self, individual: Individual) -> bool {
        match self.members.binary_search_by_key(&individual.score, |m| m.score) {
            Ok(_) => false,
            Err(pos) => {
                self.members.insert(pos, individual);
                true
            }
        }
    }

    /// Replace the worst member with `child` if the child beats it and its score is new
    pub fn offer(&mut self, child: Individual) -> bool {
        let beats_worst = self.worst().map_or(false, |w| child.score < w.score);
        if !beats_worst || self.contains_score(child.score) {
            return false;
        }
        self.members.pop();
        self.insert(child)
    }
}

/// Recombination operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    /// Reassemble the edges both parents share
    EdgeRecombination,
    /// Per position, keep the lighter of the two parents' points
    WeightPreference,
}

fn is_endpoint(segment: &[usize], point: usize) -> bool {
    segment.first() == Some(&point) || segment.last() == Some(&point)
}

/// Chain undirected edges into simple paths.
///
/// An edge touching the interior of a path would branch it and is dropped, as
/// is an edge joining the two ends of one path. An edge joining the ends of
/// two paths merges them.
pub fn shared_segments(edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut segments: Vec<Vec<usize>> = Vec::new();

    for &(a, b) in edges {
        let touches_interior = segments
            .iter()
            .any(|s| s.len() > 2 && s[1..s.len() - 1].iter().any(|&p| p == a || p == b));
        if touches_interior {
            continue;
        }

        let matching: Vec<usize> = (0..segments.len())
            .filter(|&i| is_endpoint(&segments[i], a) || is_endpoint(&segments[i], b))
            .collect();

        match matching[..] {
            [] => segments.push(vec![a, b]),
            [i] => {
                let segment = &mut segments[i];
                if is_endpoint(segment, a) && is_endpoint(segment, b) {
                    continue;
                }
                let (joint, added) = if is_endpoint(segment, a) { (a, b) } else { (b, a) };
                if segment[0] == joint {
                    segment.insert(0, added);
                } else {
                    segment.push(added);
                }
            }
            [i, j] => {
                let mut second = segments.remove(j);
                let first = &mut segments[i];
                let joint = if is_endpoint(first, a) { a } else { b };
                let other = if joint == a { b } else { a };
                if first[0] == joint {
                    first.reverse();
                }
                if second[0] != other {
                    second.reverse();
                }
                first.extend(second);
            }
            _ => {}
        }
    }

    segments
}

fn edge_set(tour: &[usize]) -> BTreeSet<(usize, usize)> {
    let n = tour.len();
    (0..n)
        .map(|i| {
            let (a, b) = (tour[i], tour[(i + 1) % n]);
            (a.min(b), a.max(b))
        })
        .collect()
}

/// Child built from the edges both parents share, in random segment order
pub fn edge_recombination(instance: &Instance, first: &[usize], second: &[usize], rng: &mut SearchRng) -> Tour {
    let first_edges = edge_set(first);
    let common: Vec<(usize, usize)> = edge_set(second).intersection(&first_edges).copied().collect();

    let mut segments = shared_segments(&common);
    segments.shuffle(rng);
    let mut partial: Tour = segments.into_iter().flatten().collect();
    if partial.is_empty() {
        partial.extend(first.first());
    }

    GreedyCycle.repair(instance, partial, first.len())
}

/// Child keeping, position by position, the lighter point of the two parents
///
/// Ties go to the second parent. A point already in the child is skipped.
pub fn weight_preference(instance: &Instance, first: &[usize], second: &[usize]) -> Tour {
    let mut used = vec![false; instance.len()];
    let mut partial = Vec::with_capacity(first.len());

    for (&a, &b) in first.iter().zip(second) {
        let chosen = if instance.weight(b) <= instance.weight(a) { b } else { a };
        if !used[chosen] {
            used[chosen] = true;
            partial.push(chosen);
        }
    }

    GreedyCycle.repair(instance, partial, first.len())
}

/// Genetic Local Search
pub struct GeneticLocalSearch {
    /// Applied to every child when present
    pub inner: Option<Box<dyn Improver>>,
    pub population_size: usize,
    pub crossover: Crossover,
    pub time_limit: Duration,
}

impl GeneticLocalSearch {
    pub fn new(
        inner: Option<Box<dyn Improver>>,
        population_size: usize,
        crossover: Crossover,
        time_limit: Duration,
    ) -> Self {
        GeneticLocalSearch {
            inner,
            population_size,
            crossover,
            time_limit,
        }
    }

    /// Random tours of `size` points, each locally optimized, with distinct scores.
    ///
    /// `improve` passes the size of the incoming tour, which is half the
    /// points under the standard visit count. Stops early after
    /// `population_size * 100` attempts.
    pub fn initialize_population(&self, instance: &Instance, size: usize, rng: &mut SearchRng) -> Result<Population> {
        let optimizer = LazySteepestSearch::new(NeighborhoodScope::Edge)?;
        let mut population = Population::new();
        let max_attempts = self.population_size.saturating_mul(100);
        let mut attempts = 0;

        while population.len() < self.population_size && attempts < max_attempts {
            attempts += 1;
            let mut candidate = Solution::from_tour(instance, random_tour(instance.len(), size, rng), self.name());
            optimizer.improve(instance, &mut candidate, rng)?;
            population.insert(Individual {
                tour: candidate.tour,
                score: candidate.score,
            });
        }

        if population.len() < self.population_size {
            log::warn!(
                "population filled to {} of {} after {} attempts",
                population.len(),
                self.population_size,
                attempts
            );
        }
        Ok(population)
    }

    pub fn recombine(&self, instance: &Instance, first: &[usize], second: &[usize], rng: &mut SearchRng) -> Tour {
        match self.crossover {
            Crossover::EdgeRecombination => edge_recombination(instance, first, second, rng),
            Crossover::WeightPreference => weight_preference(instance, first, second),
        }
    }

    /// One generation. Returns whether the child entered the population.
    pub fn step(&self, instance: &Instance, population: &mut Population, rng: &mut SearchRng) -> Result<bool> {
        if population.len() < 2 {
            return Ok(false);
        }
        let parents = index::sample(rng, population.len(), 2);
        let first = &population.members()[parents.index(0)].tour;
        let second = &population.members()[parents.index(1)].tour;

        let tour = self.recombine(instance, first, second, rng);
        let mut child = Solution::from_tour(instance, tour, self.name());
        if let Some(inner) = &self.inner {
            inner.improve(instance, &mut child, rng)?;
        }

        Ok(population.offer(Individual {
            tour: child.tour,
            score: child.score,
        }))
    }
}

impl Improver for GeneticLocalSearch {
    fn improve(&self, instance: &Instance, solution: &mut Solution, rng: &mut SearchRng) -> Result<bool> {
        let start = Instant::now();
        solution.evaluate(instance);
        let initial = solution.score;

        let mut population = self.initialize_population(instance, solution.tour.len(), rng)?;
        let mut generations = 0;

        if population.len() >= 2 {
            while start.elapsed() < self.time_limit {
                generations += 1;
                if self.step(instance, &mut population, rng)? {
                    log::debug!(
                        "generation {}: child accepted, best {} worst {}",
                        generations,
                        population.best().map_or(0, |b| b.score),
                        population.worst().map_or(0, |w| w.score)
                    );
                }
            }
        }

        if let Some(best) = population.best() {
            log::info!("{} finished after {} generations, best {}", self.name(), generations, best.score);
            solution.tour = best.tour.clone();
            solution.score = best.score;
        }
        solution.iterations = Some(generations);
        Ok(solution.score < initial)
    }

    fn name(&self) -> &str {
        match self.crossover {
            Crossover::EdgeRecombination => "GeneticLocalSearch",
            Crossover::WeightPreference => "AlternativeGeneticLocalSearch",
        }
    }
}
