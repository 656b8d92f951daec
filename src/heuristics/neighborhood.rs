//! Neighborhood generation.
//!
//! The full neighborhood enumerates every swap and every replacement; the
//! candidate neighborhood only connects each tour point with its `k` nearest
//! points (distance plus the neighbour's weight). Both are exposed through
//! [`MoveSource`], which also owns the bookkeeping that keeps a move list valid
//! after one of its moves has been applied.

use crate::error::{Result, SolverError};
use crate::heuristics::moves::{Move, MoveKind, MAX_OPERAND};
use crate::instance::Instance;
use crate::solution::points_outside;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which swap moves a neighborhood contains. Replacements are always included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborhoodScope {
    Node,
    Edge,
    Both,
}

impl NeighborhoodScope {
    pub fn has_node_swaps(self) -> bool {
        self != NeighborhoodScope::Edge
    }

    pub fn has_edge_swaps(self) -> bool {
        self != NeighborhoodScope::Node
    }
}

impl FromStr for NeighborhoodScope {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "node" | "n" => Ok(NeighborhoodScope::Node),
            "edge" | "e" => Ok(NeighborhoodScope::Edge),
            "both" | "b" => Ok(NeighborhoodScope::Both),
            other => Err(SolverError::Configuration(format!("Invalid neighborhood type: {}", other))),
        }
    }
}

impl std::fmt::Display for NeighborhoodScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NeighborhoodScope::Node => "node",
            NeighborhoodScope::Edge => "edge",
            NeighborhoodScope::Both => "both",
        };
        write!(f, "{}", name)
    }
}

/// Fail when point indices would not fit a packed move
pub fn check_capacity(point_count: usize) -> Result<()> {
    if point_count > MAX_OPERAND {
        return Err(SolverError::Capacity { points: point_count, max: MAX_OPERAND });
    }
    Ok(())
}

/// Every move of the given scope for `tour`
pub fn full_neighborhood(tour: &[usize], point_count: usize, scope: NeighborhoodScope) -> Result<Vec<Move>> {
    check_capacity(point_count)?;

    let n = tour.len();
    let outside = points_outside(tour, point_count);
    let pairs = n * n.saturating_sub(1) / 2;

    let mut capacity = n * outside.len();
    if scope.has_node_swaps() {
        capacity += pairs;
    }
    if scope.has_edge_swaps() {
        capacity += pairs.saturating_sub(n);
    }
    let mut moves = Vec::with_capacity(capacity);

    if scope.has_node_swaps() {
        for i in 0..n {
            for j in i + 1..n {
                moves.push(Move::node_swap(i, j));
            }
        }
    }

    if scope.has_edge_swaps() {
        for i in 0..n {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                moves.push(Move::edge_swap(i, j));
            }
        }
    }

    for i in 0..n {
        for &point in &outside {
            moves.push(Move::replace(i, point));
        }
    }

    Ok(moves)
}

/// Keep a full move list consistent with the tour after `chosen` is applied.
///
/// Must run before the move is applied: a replacement pushes the old point out
/// of the tour, so every replacement that targeted the incoming point now
/// targets the outgoing one.
pub fn retarget_replacements(moves: &mut [Move], tour: &[usize], chosen: &Move) {
    if chosen.kind != MoveKind::NodeReplace {
        return;
    }
    let incoming = chosen.second;
    let outgoing = tour[chosen.first];
    for mv in moves.iter_mut() {
        if mv.kind == MoveKind::NodeReplace && mv.second == incoming {
            mv.second = outgoing;
        }
    }
}

/// For every point, its `k` closest other points by distance plus their weight
#[derive(Debug, Clone)]
pub struct CandidateLists {
    closest: Vec<Vec<usize>>,
}

impl CandidateLists {
    pub fn build(instance: &Instance, count: usize) -> Result<Self> {
        let n = instance.len();
        if count < 1 {
            return Err(SolverError::Configuration("Too few candidates, min is 1".to_string()));
        }
        if count > n.saturating_sub(1) {
            return Err(SolverError::Configuration(format!(
                "Too many candidates, max is {}",
                n.saturating_sub(1)
            )));
        }

        let closest = (0..n)
            .map(|i| {
                let mut others: Vec<(i64, usize)> = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| (instance.distance(i, j) + instance.weight(j), j))
                    .collect();
                others.sort();
                others.into_iter().take(count).map(|(_, j)| j).collect()
            })
            .collect();

        Ok(CandidateLists { closest })
    }

    /// Candidates of one point, closest first
    pub fn of(&self, point: usize) -> &[usize] {
        &self.closest[point]
    }

    pub fn count(&self) -> usize {
        self.closest.first().map_or(0, Vec::len)
    }

    /// Moves that bring a tour point next to one of its candidates
    pub fn neighborhood(&self, tour: &[usize]) -> Vec<Move> {
        let n = tour.len();
        let mut position = vec![None; self.closest.len()];
        for (i, &point) in tour.iter().enumerate() {
            position[point] = Some(i);
        }

        let mut moves = Vec::with_capacity(n * self.count() * 2);
        for i in 0..n {
            let successor = (i + 1) % n;
            let predecessor = (i + n - 1) % n;
            for &candidate in self.of(tour[i]) {
                match position[candidate] {
                    None => {
                        moves.push(Move::replace(successor, candidate));
                        moves.push(Move::replace(predecessor, candidate));
                    }
                    Some(candidate_pos) => {
                        let candidate_predecessor = (candidate_pos + n - 1) % n;
                        moves.push(Move::edge_swap(i, candidate_pos));
                        moves.push(Move::edge_swap(predecessor, candidate_predecessor));
                    }
                }
            }
        }
        moves
    }
}

/// Supplies the move list of a descent and keeps it valid as moves are applied
pub trait MoveSource {
    fn moves(&self, tour: &[usize]) -> Result<Vec<Move>>;

    /// Called with the tour still in its pre-move state
    fn before_apply(&self, _moves: &mut Vec<Move>, _tour: &[usize], _chosen: &Move) {}

    /// Called once the chosen move is in the tour
    fn after_apply(&self, _moves: &mut Vec<Move>, _tour: &[usize]) -> Result<()> {
        Ok(())
    }
}

/// All moves of a scope, patched incrementally after each replacement
pub struct FullNeighborhood {
    pub scope: NeighborhoodScope,
    pub point_count: usize,
}

impl MoveSource for FullNeighborhood {
    fn moves(&self, tour: &[usize]) -> Result<Vec<Move>> {
        full_neighborhood(tour, self.point_count, self.scope)
    }

    fn before_apply(&self, moves: &mut Vec<Move>, tour: &[usize], chosen: &Move) {
        retarget_replacements(moves, tour, chosen);
    }
}

/// Candidate-restricted moves, rebuilt from scratch after every applied move
pub struct CandidateNeighborhood<'a> {
    pub lists: &'a CandidateLists,
}

impl MoveSource for CandidateNeighborhood<'_> {
    fn moves(&self, tour: &[usize]) -> Result<Vec<Move>> {
        Ok(self.lists.neighborhood(tour))
    }

    fn after_apply(&self, moves: &mut Vec<Move>, tour: &[usize]) -> Result<()> {
        *moves = self.lists.neighborhood(tour);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests_support::delta_instance;
    use crate::instance::Point;

    #[test]
    fn test_full_neighborhood_sizes() {
        let tour = vec![0, 1, 2, 3, 4];
        let outside = 3;
        let both = full_neighborhood(&tour, 8, NeighborhoodScope::Both).unwrap();
        let node = full_neighborhood(&tour, 8, NeighborhoodScope::Node).unwrap();
        let edge = full_neighborhood(&tour, 8, NeighborhoodScope::Edge).unwrap();

        assert_eq!(node.len(), 10 + 5 * outside);
        assert_eq!(edge.len(), 5 + 5 * outside);
        assert_eq!(both.len(), 10 + 5 + 5 * outside);
    }

    #[test]
    fn test_full_neighborhood_excludes_adjacent_edge_swaps() {
        let tour = vec![0, 1, 2, 3, 4, 5];
        let moves = full_neighborhood(&tour, 6, NeighborhoodScope::Edge).unwrap();
        for mv in moves.iter().filter(|m| m.kind == MoveKind::EdgeSwap) {
            assert!(mv.first < mv.second);
            assert!(mv.second - mv.first >= 2);
            assert!(!(mv.first == 0 && mv.second == 5));
        }
        assert!(moves.iter().all(|m| m.kind != MoveKind::NodeSwap));
    }

    #[test]
    fn test_full_neighborhood_capacity_error() {
        let result = full_neighborhood(&[0, 1, 2], MAX_OPERAND + 1, NeighborhoodScope::Both);
        assert!(matches!(result, Err(SolverError::Capacity { .. })));
    }

    #[test]
    fn test_retarget_replacements() {
        let mut tour = vec![0, 1, 2];
        let mut moves = full_neighborhood(&tour, 5, NeighborhoodScope::Edge).unwrap();
        let chosen = Move::replace(1, 4);

        retarget_replacements(&mut moves, &tour, &chosen);
        chosen.apply(&mut tour).unwrap();

        let replacements: Vec<&Move> = moves.iter().filter(|m| m.kind == MoveKind::NodeReplace).collect();
        assert_eq!(replacements.len(), 3 * 2);
        for mv in replacements {
            assert!(mv.is_applicable(&tour), "{} not applicable to {:?}", mv, tour);
        }
    }

    #[test]
    fn test_move_sources_stay_applicable_as_moves_are_applied() {
        let instance = delta_instance();
        let lists = CandidateLists::build(&instance, 3).unwrap();
        let full = FullNeighborhood { scope: NeighborhoodScope::Both, point_count: instance.len() };
        let candidate = CandidateNeighborhood { lists: &lists };
        let chain = [
            Move::replace(1, 4),
            Move::edge_swap(0, 2),
            Move::replace(3, 5),
            Move::node_swap(0, 3),
            Move::replace(0, 1),
        ];

        for source in [&full as &dyn MoveSource, &candidate] {
            let mut tour = vec![0, 1, 2, 3];
            let mut moves = source.moves(&tour).unwrap();
            for chosen in chain {
                source.before_apply(&mut moves, &tour, &chosen);
                chosen.apply(&mut tour).unwrap();
                source.after_apply(&mut moves, &tour).unwrap();
                for mv in &moves {
                    assert!(mv.is_applicable(&tour), "{} not applicable to {:?}", mv, tour);
                }
            }
        }
    }

    #[test]
    fn test_candidate_lists_order() {
        let instance = delta_instance();
        let lists = CandidateLists::build(&instance, 2).unwrap();
        // From point 0: 1 -> 3+12, 2 -> 4+6, 3 -> 8+12, 4 -> 4+55, 5 -> 14+1, 6 -> 10+4, 7 -> 10+34
        assert_eq!(lists.of(0), &[2, 6]);
        assert_eq!(lists.count(), 2);
    }

    #[test]
    fn test_candidate_ties_broken_by_index() {
        let instance = Instance::new(
            "ties",
            vec![Point::new(0, 0, 0), Point::new(1, 0, 0), Point::new(-1, 0, 0), Point::new(0, 5, 0)],
        );
        let lists = CandidateLists::build(&instance, 3).unwrap();
        assert_eq!(lists.of(0), &[1, 2, 3]);
    }

    #[test]
    fn test_candidate_count_bounds() {
        let instance = delta_instance();
        assert!(matches!(CandidateLists::build(&instance, 0), Err(SolverError::Configuration(_))));
        assert!(matches!(CandidateLists::build(&instance, 8), Err(SolverError::Configuration(_))));
        assert!(CandidateLists::build(&instance, 7).is_ok());
    }

    #[test]
    fn test_candidate_neighborhood_shape() {
        let instance = delta_instance();
        let lists = CandidateLists::build(&instance, 2).unwrap();
        let tour = vec![0, 1, 2, 3];
        let moves = lists.neighborhood(&tour);
        assert_eq!(moves.len(), tour.len() * 2 * 2);

        // Point 0 sits at position 0; its candidate 2 is inside (position 2), candidate 6 is outside
        assert_eq!(moves[0], Move::edge_swap(0, 2));
        assert_eq!(moves[1], Move::edge_swap(3, 1));
        assert_eq!(moves[2], Move::replace(1, 6));
        assert_eq!(moves[3], Move::replace(3, 6));
    }
}
