//! Move model: the elementary edits a local search can make to a tour.
//!
//! A [`Move`] is a plain tagged value. [`MoveToken`] packs one into a single
//! `u32` (2 bits of kind, 15 bits per operand) for compact priority-queue
//! entries; all bit arithmetic stays in this module.

use crate::error::{Result, SolverError};
use crate::heuristics::delta::{edge_swap_delta, node_swap_delta, replace_node_delta};
use crate::instance::Instance;
use crate::solution::{replace_node, swap_edges, swap_nodes};

const VAL_BITS: u32 = 15;
const VAL_MASK: u32 = (1 << VAL_BITS) - 1;
const KIND_SHIFT: u32 = VAL_BITS * 2;

/// Largest operand a packed token can hold; also the largest supported point count
pub const MAX_OPERAND: usize = VAL_MASK as usize;

/// Move kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoveKind {
    /// Swap the points at two tour positions
    NodeSwap,
    /// Reverse the segment between two positions (2-opt)
    EdgeSwap,
    /// Put a point from outside the tour at a position
    NodeReplace,
    /// Sentinel: no move
    Invalid,
}

impl MoveKind {
    fn bits(self) -> u32 {
        match self {
            MoveKind::NodeSwap => 0,
            MoveKind::EdgeSwap => 1,
            MoveKind::NodeReplace => 2,
            MoveKind::Invalid => 3,
        }
    }

    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => MoveKind::NodeSwap,
            1 => MoveKind::EdgeSwap,
            2 => MoveKind::NodeReplace,
            _ => MoveKind::Invalid,
        }
    }
}

/// One candidate edit. Operands are tour positions, except the second operand
/// of `NodeReplace`, which is a point index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub kind: MoveKind,
    pub first: usize,
    pub second: usize,
}

/// Packed form of a [`Move`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoveToken(u32);

impl Move {
    pub const INVALID: Move = Move { kind: MoveKind::Invalid, first: 0, second: 0 };

    pub fn node_swap(first: usize, second: usize) -> Self {
        Move { kind: MoveKind::NodeSwap, first, second }
    }

    pub fn edge_swap(first: usize, second: usize) -> Self {
        Move { kind: MoveKind::EdgeSwap, first, second }
    }

    pub fn replace(pos: usize, point: usize) -> Self {
        Move { kind: MoveKind::NodeReplace, first: pos, second: point }
    }

    /// True for the `Invalid` sentinel
    pub fn is_forbidden(&self) -> bool {
        self.kind == MoveKind::Invalid
    }

    /// A replacement is applicable only while its point is outside the tour
    pub fn is_applicable(&self, tour: &[usize]) -> bool {
        match self.kind {
            MoveKind::NodeReplace => !tour.contains(&self.second),
            _ => true,
        }
    }

    /// Exact cost change of applying this move to `tour`
    pub fn delta(&self, instance: &Instance, tour: &[usize]) -> Result<i64> {
        match self.kind {
            MoveKind::NodeSwap => Ok(node_swap_delta(instance, tour, self.first, self.second)),
            MoveKind::EdgeSwap => Ok(edge_swap_delta(instance, tour, self.first, self.second)),
            MoveKind::NodeReplace => Ok(replace_node_delta(instance, tour, self.first, self.second)),
            MoveKind::Invalid => Err(SolverError::InvalidMove("evaluate called on a forbidden move".to_string())),
        }
    }

    pub fn apply(&self, tour: &mut [usize]) -> Result<()> {
        match self.kind {
            MoveKind::NodeSwap => swap_nodes(tour, self.first, self.second),
            MoveKind::EdgeSwap => swap_edges(tour, self.first, self.second),
            MoveKind::NodeReplace => replace_node(tour, self.first, self.second),
            MoveKind::Invalid => {
                return Err(SolverError::InvalidMove("apply called on a forbidden move".to_string()))
            }
        }
        Ok(())
    }

    /// Pack into a token. Operands above [`MAX_OPERAND`] are a capacity error.
    pub fn encode(&self) -> Result<MoveToken> {
        let max = self.first.max(self.second);
        if max > MAX_OPERAND {
            return Err(SolverError::Capacity { points: max + 1, max: MAX_OPERAND });
        }
        Ok(MoveToken(
            (self.kind.bits() << KIND_SHIFT) | ((self.first as u32) << VAL_BITS) | self.second as u32,
        ))
    }
}

impl MoveToken {
    pub fn decode(self) -> Move {
        Move {
            kind: MoveKind::from_bits(self.0 >> KIND_SHIFT),
            first: ((self.0 >> VAL_BITS) & VAL_MASK) as usize,
            second: (self.0 & VAL_MASK) as usize,
        }
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            MoveKind::NodeSwap => write!(f, "NodeSwap({}, {})", self.first, self.second),
            MoveKind::EdgeSwap => write!(f, "EdgeSwap({}, {})", self.first, self.second),
            MoveKind::NodeReplace => write!(f, "NodeReplace(pos {}, point {})", self.first, self.second),
            MoveKind::Invalid => write!(f, "Forbidden"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests_support::delta_instance;
    use crate::solution::evaluate;

    #[test]
    fn test_token_keeps_kind_and_operands() {
        for mv in [
            Move::node_swap(3, 17),
            Move::edge_swap(0, MAX_OPERAND),
            Move::replace(MAX_OPERAND, 0),
            Move::INVALID,
        ] {
            assert_eq!(mv.encode().unwrap().decode(), mv);
        }
    }

    #[test]
    fn test_operand_overflow_is_capacity_error() {
        let result = Move::replace(2, MAX_OPERAND + 1).encode();
        assert!(matches!(result, Err(SolverError::Capacity { .. })));
    }

    #[test]
    fn test_forbidden_move() {
        let instance = delta_instance();
        let mut tour = vec![0, 1, 2];
        assert!(Move::INVALID.is_forbidden());
        assert!(!Move::edge_swap(0, 2).is_forbidden());
        assert!(matches!(Move::INVALID.delta(&instance, &tour), Err(SolverError::InvalidMove(_))));
        assert!(matches!(Move::INVALID.apply(&mut tour), Err(SolverError::InvalidMove(_))));
        assert_eq!(tour, vec![0, 1, 2]);
    }

    #[test]
    fn test_applicability() {
        let tour = vec![0, 1, 2, 3, 4];
        assert!(!Move::replace(1, 3).is_applicable(&tour));
        assert!(Move::replace(1, 6).is_applicable(&tour));
        assert!(Move::node_swap(0, 4).is_applicable(&tour));
        assert!(Move::edge_swap(1, 3).is_applicable(&tour));
    }

    #[test]
    fn test_apply_matches_delta() {
        let instance = delta_instance();
        let mut tour = vec![0, 1, 2, 3, 4, 5];
        for mv in [Move::edge_swap(4, 1), Move::node_swap(5, 2), Move::replace(3, 7), Move::edge_swap(0, 3)] {
            let before = evaluate(&instance, &tour);
            let delta = mv.delta(&instance, &tour).unwrap();
            mv.apply(&mut tour).unwrap();
            assert_eq!(evaluate(&instance, &tour), before + delta, "{}", mv);
        }
    }

    #[test]
    fn test_noop_moves() {
        let instance = delta_instance();
        let original = vec![0, 1, 2, 3, 4, 5];
        for mv in [Move::edge_swap(2, 2), Move::edge_swap(2, 3), Move::edge_swap(5, 0), Move::node_swap(4, 4)] {
            let mut tour = original.clone();
            assert_eq!(mv.delta(&instance, &tour).unwrap(), 0);
            mv.apply(&mut tour).unwrap();
            assert_eq!(tour, original);
        }
    }
}
