//! Solution representation and manipulation.
//!
//! A tour is an ordered cycle of distinct point indices. The elementary edits
//! below mutate a tour in place; none of them re-scores it, that is the job of
//! the delta evaluator during search and of [`evaluate`] everywhere else.

use crate::error::{Result, SolverError};
use crate::instance::Instance;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Ordered cycle of point indices; the last element connects back to the first
pub type Tour = Vec<usize>;

/// Exchange the points at two tour positions
pub fn swap_nodes(tour: &mut [usize], first: usize, second: usize) {
    tour.swap(first, second);
}

/// Overwrite one tour position. The caller guarantees `point` is not already in the tour.
pub fn replace_node(tour: &mut [usize], pos: usize, point: usize) {
    tour[pos] = point;
}

/// 2-opt: reverse the segment strictly after the lower position up to the higher one.
///
/// No-op when the positions are equal or adjacent, including the wraparound
/// pair `(0, len - 1)`.
pub fn swap_edges(tour: &mut [usize], first: usize, second: usize) {
    let diff = first.abs_diff(second);
    if diff < 2 || diff == tour.len() - 1 {
        return;
    }
    let (lo, hi) = if first < second { (first, second) } else { (second, first) };
    tour[lo + 1..=hi].reverse();
}

/// Full cost of a tour: cyclic edge lengths plus the weight of every visited point
pub fn evaluate(instance: &Instance, tour: &[usize]) -> i64 {
    let n = tour.len();
    (0..n)
        .map(|i| instance.distance(tour[i], tour[(i + 1) % n]) + instance.weight(tour[i]))
        .sum()
}

/// Points of the instance that are not part of the tour, in index order
pub fn points_outside(tour: &[usize], point_count: usize) -> Vec<usize> {
    let mut present = vec![false; point_count];
    for &p in tour {
        present[p] = true;
    }
    (0..point_count).filter(|&p| !present[p]).collect()
}

/// A scored tour together with bookkeeping about how it was produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Visited points in cycle order
    pub tour: Tour,
    /// Total cost (travel + weights)
    pub score: i64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a solution from a tour
    pub fn from_tour(instance: &Instance, tour: Tour, algorithm: &str) -> Self {
        let score = evaluate(instance, &tour);
        Solution {
            tour,
            score,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Re-score the tour from scratch
    pub fn evaluate(&mut self, instance: &Instance) {
        self.score = evaluate(instance, &self.tour);
    }

    /// Every index is in range and appears once
    pub fn is_valid(&self, instance: &Instance) -> bool {
        let unique: HashSet<usize> = self.tour.iter().copied().collect();
        unique.len() == self.tour.len() && self.tour.iter().all(|&p| p < instance.len())
    }

    /// Write one point index per line, then the score, then optionally the elapsed microseconds
    pub fn write_to<P: AsRef<Path>>(&self, path: P, elapsed_micros: Option<u128>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for point in &self.tour {
            writeln!(writer, "{}", point)?;
        }
        writeln!(writer, "{}", self.score)?;
        if let Some(micros) = elapsed_micros {
            writeln!(writer, "{}", micros)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a solution file written by [`Solution::write_to`] and re-score it
    pub fn read_from<P: AsRef<Path>>(path: P, instance: &Instance, timed: bool) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mut values = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.parse::<i64>()
                    .map_err(|_| SolverError::Parse(format!("Invalid solution line: {}", line)))
            })
            .collect::<Result<Vec<i64>>>()?;

        let trailing = if timed { 2 } else { 1 };
        if values.len() < trailing {
            return Err(SolverError::Parse("Solution file is missing its score line".to_string()));
        }
        values.truncate(values.len() - trailing);

        let tour = values
            .into_iter()
            .map(|v| {
                usize::try_from(v)
                    .ok()
                    .filter(|&p| p < instance.len())
                    .ok_or_else(|| SolverError::Parse(format!("Point index out of range: {}", v)))
            })
            .collect::<Result<Tour>>()?;

        let algorithm = path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let solution = Solution::from_tour(instance, tour, &algorithm);
        if !solution.is_valid(instance) {
            return Err(SolverError::Parse("Solution visits a point twice".to_string()));
        }
        Ok(solution)
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Score: {}", self.score)?;
        writeln!(f, "  Visited: {}", self.tour.len())?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}
