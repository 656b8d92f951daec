//! Local search strategies.
//!
//! This module implements the descent strategies:
//! - Greedy (first improvement over a shuffled move list)
//! - Steepest (best improvement), over the full or the candidate neighborhood
//! - Lazy steepest, driven by a priority queue of improving moves
//!
//! Every strategy, and every metaheuristic built on top of them, implements
//! [`Improver`].

use crate::error::{Result, SolverError};
use crate::heuristics::moves::{Move, MoveKind, MoveToken};
use crate::heuristics::neighborhood::{
    check_capacity, full_neighborhood, CandidateLists, CandidateNeighborhood, FullNeighborhood, MoveSource,
    NeighborhoodScope,
};
use crate::instance::Instance;
use crate::random::SearchRng;
use crate::solution::{evaluate, points_outside, Solution};
use rand::seq::SliceRandom;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Anything that can improve a solution in place
pub trait Improver {
    /// Improve `solution`, returning whether its score went down
    fn improve(&self, instance: &Instance, solution: &mut Solution, rng: &mut SearchRng) -> Result<bool>;
    fn name(&self) -> &str;
}

/// Best-improvement descent over any move source.
///
/// The source keeps its move list applicable to the current tour, so moves
/// are evaluated without a membership check. Returns the final score.
fn steepest_descent(instance: &Instance, solution: &mut Solution, source: &dyn MoveSource) -> Result<i64> {
    let mut score = evaluate(instance, &solution.tour);
    let mut moves = source.moves(&solution.tour)?;

    loop {
        let mut best_move = Move::INVALID;
        let mut best_delta = 0;

        for mv in &moves {
            debug_assert!(mv.is_applicable(&solution.tour), "stale move {}", mv);
            let delta = mv.delta(instance, &solution.tour)?;
            if delta < best_delta {
                best_delta = delta;
                best_move = *mv;
            }
        }

        if best_move.is_forbidden() {
            break;
        }

        source.before_apply(&mut moves, &solution.tour, &best_move);
        best_move.apply(&mut solution.tour)?;
        source.after_apply(&mut moves, &solution.tour)?;
        score += best_delta;
    }

    Ok(score)
}

/// Greedy (first improvement) local search
///
/// Reshuffles the move list every round and applies the first improving move.
pub struct GreedySearch {
    pub scope: NeighborhoodScope,
}

impl GreedySearch {
    pub fn new(scope: NeighborhoodScope) -> Self {
        GreedySearch { scope }
    }
}

impl Default for GreedySearch {
    fn default() -> Self {
        Self::new(NeighborhoodScope::Edge)
    }
}

impl Improver for GreedySearch {
    fn improve(&self, instance: &Instance, solution: &mut Solution, rng: &mut SearchRng) -> Result<bool> {
        if solution.tour.len() < 3 {
            return Ok(false);
        }
        let source = FullNeighborhood { scope: self.scope, point_count: instance.len() };
        let initial = evaluate(instance, &solution.tour);
        let mut score = initial;
        let mut moves = source.moves(&solution.tour)?;

        loop {
            moves.shuffle(rng);

            let mut chosen = None;
            for mv in &moves {
                debug_assert!(mv.is_applicable(&solution.tour), "stale move {}", mv);
                let delta = mv.delta(instance, &solution.tour)?;
                if delta < 0 {
                    chosen = Some((*mv, delta));
                    break;
                }
            }

            let Some((mv, delta)) = chosen else {
                break;
            };
            source.before_apply(&mut moves, &solution.tour, &mv);
            mv.apply(&mut solution.tour)?;
            score += delta;
        }

        solution.score = score;
        Ok(score < initial)
    }

    fn name(&self) -> &str {
        "Greedy"
    }
}

/// Steepest (best improvement) local search
///
/// With candidate lists the neighborhood is restricted to moves that bring a
/// point next to one of its nearest candidates.
pub struct SteepestSearch {
    pub scope: NeighborhoodScope,
    candidates: Option<CandidateLists>,
}

impl SteepestSearch {
    pub fn new(scope: NeighborhoodScope) -> Self {
        SteepestSearch { scope, candidates: None }
    }

    /// Candidate-restricted variant; `count` must lie in `[1, points - 1]`
    pub fn with_candidates(instance: &Instance, scope: NeighborhoodScope, count: usize) -> Result<Self> {
        if scope == NeighborhoodScope::Node {
            return Err(SolverError::Configuration(
                "Candidate neighborhood needs edge moves, node scope is not supported".to_string(),
            ));
        }
        check_capacity(instance.len())?;
        let lists = CandidateLists::build(instance, count)?;
        Ok(SteepestSearch { scope, candidates: Some(lists) })
    }

    pub fn is_candidate(&self) -> bool {
        self.candidates.is_some()
    }
}

impl Default for SteepestSearch {
    fn default() -> Self {
        Self::new(NeighborhoodScope::Edge)
    }
}

impl Improver for SteepestSearch {
    fn improve(&self, instance: &Instance, solution: &mut Solution, _rng: &mut SearchRng) -> Result<bool> {
        if solution.tour.len() < 3 {
            return Ok(false);
        }
        let initial = evaluate(instance, &solution.tour);

        let score = match &self.candidates {
            Some(lists) => {
                let source = CandidateNeighborhood { lists };
                steepest_descent(instance, solution, &source)?
            }
            None => {
                let source = FullNeighborhood { scope: self.scope, point_count: instance.len() };
                steepest_descent(instance, solution, &source)?
            }
        };

        solution.score = score;
        Ok(score < initial)
    }

    fn name(&self) -> &str {
        if self.candidates.is_some() {
            "Steepest-Candidate"
        } else {
            "Steepest"
        }
    }
}

/// Steepest descent that keeps improving moves in a priority queue
///
/// Only the moves touching a position whose point or neighbours changed are
/// re-evaluated after each applied move. Queue entries whose delta no longer
/// matches are dropped when popped.
pub struct LazySteepestSearch;

impl LazySteepestSearch {
    pub fn new(scope: NeighborhoodScope) -> Result<Self> {
        if scope != NeighborhoodScope::Edge {
            return Err(SolverError::Configuration(format!(
                "Lazy steepest search only supports the edge neighborhood, got {}",
                scope
            )));
        }
        Ok(LazySteepestSearch)
    }
}

impl Improver for LazySteepestSearch {
    fn improve(&self, instance: &Instance, solution: &mut Solution, _rng: &mut SearchRng) -> Result<bool> {
        let n = solution.tour.len();
        if n < 3 {
            return Ok(false);
        }
        let initial = evaluate(instance, &solution.tour);
        let mut score = initial;

        let mut queue: BinaryHeap<Reverse<(i64, MoveToken)>> = BinaryHeap::new();
        let push = |queue: &mut BinaryHeap<Reverse<(i64, MoveToken)>>, mv: Move, tour: &[usize]| -> Result<()> {
            let delta = mv.delta(instance, tour)?;
            if delta < 0 {
                queue.push(Reverse((delta, mv.encode()?)));
            }
            Ok(())
        };

        for mv in full_neighborhood(&solution.tour, instance.len(), NeighborhoodScope::Edge)? {
            push(&mut queue, mv, &solution.tour)?;
        }

        while let Some(Reverse((queued_delta, token))) = queue.pop() {
            let mv = token.decode();
            if !mv.is_applicable(&solution.tour) {
                continue;
            }
            let delta = mv.delta(instance, &solution.tour)?;
            if delta >= 0 || delta != queued_delta {
                continue;
            }

            let previous = solution.tour.clone();
            mv.apply(&mut solution.tour)?;
            score += delta;

            let tour = &solution.tour;
            let changed = |pos: usize| tour[pos] != previous[pos];
            let outside = points_outside(tour, instance.len());
            let displaced = (mv.kind == MoveKind::NodeReplace).then(|| previous[mv.first]);

            for i in 0..n {
                let before = (i + n - 1) % n;
                let after = (i + 1) % n;

                if let Some(point) = displaced {
                    push(&mut queue, Move::replace(i, point), tour)?;
                }
                if !changed(i) && !changed(before) && !changed(after) {
                    continue;
                }
                for &point in outside.iter().filter(|&&p| Some(p) != displaced) {
                    push(&mut queue, Move::replace(i, point), tour)?;
                }
            }

            for i in 0..n {
                let i_next = (i + 1) % n;
                for j in i + 2..n {
                    if i == 0 && j == n - 1 {
                        continue;
                    }
                    let j_next = (j + 1) % n;
                    if !changed(i) && !changed(j) && !changed(i_next) && !changed(j_next) {
                        continue;
                    }
                    push(&mut queue, Move::edge_swap(i, j), tour)?;
                }
            }
        }

        solution.score = score;
        Ok(score < initial)
    }

    fn name(&self) -> &str {
        "Steepest-Lazy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests_support::{delta_instance, scattered_instance};
    use crate::random::{random_tour, seeded_rng};

    fn assert_local_optimum(instance: &Instance, solution: &Solution, scope: NeighborhoodScope) {
        let moves = full_neighborhood(&solution.tour, instance.len(), scope).unwrap();
        for mv in moves {
            assert!(mv.delta(instance, &solution.tour).unwrap() >= 0, "{} still improves", mv);
        }
    }

    fn run(improver: &dyn Improver, instance: &Instance, tour: Vec<usize>, seed: u64) -> Solution {
        let mut solution = Solution::from_tour(instance, tour, "test");
        let mut rng = seeded_rng(seed);
        improver.improve(instance, &mut solution, &mut rng).unwrap();
        solution
    }

    #[test]
    fn test_greedy_reaches_local_optimum() {
        let instance = scattered_instance(30);
        let tour = random_tour(30, 15, &mut seeded_rng(1));
        let start = evaluate(&instance, &tour);

        let solution = run(&GreedySearch::new(NeighborhoodScope::Both), &instance, tour, 2);

        assert!(solution.is_valid(&instance));
        assert_eq!(solution.tour.len(), 15);
        assert_eq!(solution.score, evaluate(&instance, &solution.tour));
        assert!(solution.score <= start);
        assert_local_optimum(&instance, &solution, NeighborhoodScope::Both);
    }

    #[test]
    fn test_steepest_reaches_local_optimum() {
        let instance = scattered_instance(30);
        for scope in [NeighborhoodScope::Node, NeighborhoodScope::Edge, NeighborhoodScope::Both] {
            let tour = random_tour(30, 15, &mut seeded_rng(4));
            let solution = run(&SteepestSearch::new(scope), &instance, tour, 0);

            assert!(solution.is_valid(&instance));
            assert_eq!(solution.score, evaluate(&instance, &solution.tour));
            assert_local_optimum(&instance, &solution, scope);
        }
    }

    #[test]
    fn test_steepest_reports_improvement() {
        let instance = scattered_instance(20);
        let tour = random_tour(20, 10, &mut seeded_rng(9));
        let mut solution = Solution::from_tour(&instance, tour, "test");
        let start = solution.score;

        let improved = SteepestSearch::default()
            .improve(&instance, &mut solution, &mut seeded_rng(0))
            .unwrap();
        assert_eq!(improved, solution.score < start);

        // Second pass starts at a local optimum
        let again = SteepestSearch::default()
            .improve(&instance, &mut solution, &mut seeded_rng(0))
            .unwrap();
        assert!(!again);
    }

    #[test]
    fn test_candidate_steepest_no_better_than_full() {
        let instance = delta_instance();
        let tour = vec![0, 1, 2, 3];

        let full = run(&SteepestSearch::new(NeighborhoodScope::Edge), &instance, tour.clone(), 0);
        let candidate = SteepestSearch::with_candidates(&instance, NeighborhoodScope::Edge, 2).unwrap();
        let restricted = run(&candidate, &instance, tour, 0);

        assert!(restricted.is_valid(&instance));
        assert_eq!(restricted.score, evaluate(&instance, &restricted.tour));
        assert!(restricted.score >= full.score);
    }

    #[test]
    fn test_candidate_configuration_errors() {
        let instance = delta_instance();
        assert!(SteepestSearch::with_candidates(&instance, NeighborhoodScope::Node, 2).is_err());
        assert!(SteepestSearch::with_candidates(&instance, NeighborhoodScope::Both, 0).is_err());
        assert!(SteepestSearch::with_candidates(&instance, NeighborhoodScope::Both, 8).is_err());
        assert!(SteepestSearch::with_candidates(&instance, NeighborhoodScope::Both, 7).unwrap().is_candidate());
    }

    #[test]
    fn test_lazy_requires_edge_scope() {
        assert!(LazySteepestSearch::new(NeighborhoodScope::Node).is_err());
        assert!(LazySteepestSearch::new(NeighborhoodScope::Both).is_err());
        assert!(LazySteepestSearch::new(NeighborhoodScope::Edge).is_ok());
    }

    #[test]
    fn test_lazy_reaches_local_optimum() {
        let instance = scattered_instance(40);
        let tour = random_tour(40, 20, &mut seeded_rng(6));
        let start = evaluate(&instance, &tour);
        let lazy = LazySteepestSearch::new(NeighborhoodScope::Edge).unwrap();

        let solution = run(&lazy, &instance, tour, 0);

        assert!(solution.is_valid(&instance));
        assert_eq!(solution.score, evaluate(&instance, &solution.tour));
        assert!(solution.score < start);
        assert_local_optimum(&instance, &solution, NeighborhoodScope::Edge);
    }

    #[test]
    fn test_tiny_tours_are_left_alone() {
        let instance = delta_instance();
        let solution = run(&GreedySearch::default(), &instance, vec![4, 1], 0);
        assert_eq!(solution.tour, vec![4, 1]);
    }
}
