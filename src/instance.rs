//! Module for parsing and representing weighted point instances.
//!
//! An instance is a fixed table of points, each with an integer position and
//! an integer weight paid whenever the point is visited. Distances are rounded
//! Euclidean and are computed once when the instance is built.

use crate::error::{Result, SolverError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A point of the instance. Its identity is its index in the point table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: i64,
    /// Y coordinate
    pub y: i64,
    /// Cost incurred by visiting the point
    pub weight: i64,
}

impl Point {
    pub fn new(x: i64, y: i64, weight: i64) -> Self {
        Point { x, y, weight }
    }

    /// Rounded Euclidean distance, weights are not included
    pub fn distance_to(&self, other: &Point) -> i64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt().round() as i64
    }
}

/// Represents a complete instance: the point table and its distance matrix
///
/// Only the name and points are serialized; deserializing rebuilds the matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "InstanceRecord")]
pub struct Instance {
    /// Name of the instance
    pub name: String,
    /// List of all points
    pub points: Vec<Point>,
    /// Precomputed distance matrix
    #[serde(skip)]
    pub distances: Vec<Vec<i64>>,
}

#[derive(Deserialize)]
struct InstanceRecord {
    name: String,
    points: Vec<Point>,
}

impl From<InstanceRecord> for Instance {
    fn from(record: InstanceRecord) -> Self {
        Instance::new(&record.name, record.points)
    }
}

impl Instance {
    pub fn new(name: &str, points: Vec<Point>) -> Self {
        let distances = Self::compute_distance_matrix(&points);
        Instance {
            name: name.to_string(),
            points,
            distances,
        }
    }

    /// Parse an instance from a file with one `x;y;weight` line per point
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let mut points = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            let field = |idx: usize, what: &str| -> Result<i64> {
                record
                    .get(idx)
                    .ok_or_else(|| SolverError::Parse(format!("Missing {} on line {}", what, points.len() + 1)))?
                    .parse::<i64>()
                    .map_err(|_| SolverError::Parse(format!("Invalid {} on line {}", what, points.len() + 1)))
            };
            let x = field(0, "x coordinate")?;
            let y = field(1, "y coordinate")?;
            let weight = field(2, "weight")?;
            points.push(Point::new(x, y, weight));
        }

        if points.is_empty() {
            return Err(SolverError::Parse(format!("No points in {:?}", path)));
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Instance::new(&name, points))
    }

    /// Compute rounded Euclidean distance matrix
    fn compute_distance_matrix(points: &[Point]) -> Vec<Vec<i64>> {
        let n = points.len();
        let mut matrix = vec![vec![0; n]; n];

        for i in 0..n {
            for j in i + 1..n {
                let d = points[i].distance_to(&points[j]);
                matrix[i][j] = d;
                matrix[j][i] = d;
            }
        }

        matrix
    }

    /// Get the distance between two points
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> i64 {
        self.distances[i][j]
    }

    /// Get the weight of a point
    #[inline]
    pub fn weight(&self, i: usize) -> i64 {
        self.points[i].weight
    }

    /// Number of points in the table
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points visited by the standard configuration (half, rounded up)
    pub fn default_visit_count(&self) -> usize {
        (self.len() + 1) / 2
    }

    /// Get instance statistics as a string
    pub fn statistics(&self) -> String {
        let n = self.len();
        let weights: Vec<i64> = self.points.iter().map(|p| p.weight).collect();
        let min_w = weights.iter().copied().min().unwrap_or(0);
        let max_w = weights.iter().copied().max().unwrap_or(0);
        let total_w: i64 = weights.iter().sum();

        let mut min_d = i64::MAX;
        let mut max_d = 0;
        let mut total_d = 0i64;
        let mut pairs = 0i64;
        for i in 0..n {
            for j in i + 1..n {
                let d = self.distance(i, j);
                min_d = min_d.min(d);
                max_d = max_d.max(d);
                total_d += d;
                pairs += 1;
            }
        }
        if pairs == 0 {
            min_d = 0;
        }

        format!(
            "Instance: {}\n\
             Points: {}\n\
             Default visit count: {}\n\
             Weights: min {} / max {} / avg {:.2}\n\
             Distances: min {} / max {} / avg {:.2}",
            self.name,
            n,
            self.default_visit_count(),
            min_w,
            max_w,
            if n > 0 { total_w as f64 / n as f64 } else { 0.0 },
            min_d,
            max_d,
            if pairs > 0 { total_d as f64 / pairs as f64 } else { 0.0 },
        )
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_distance_matrix_matches_reference() {
        let instance = tests_support::delta_instance();
        let reference = vec![
            vec![0, 3, 4, 8, 4, 14, 10, 10],
            vec![3, 0, 3, 5, 1, 11, 9, 7],
            vec![4, 3, 0, 4, 3, 10, 6, 7],
            vec![8, 5, 4, 0, 4, 6, 6, 3],
            vec![4, 1, 3, 4, 0, 9, 8, 5],
            vec![14, 11, 10, 6, 9, 0, 9, 4],
            vec![10, 9, 6, 6, 8, 9, 0, 8],
            vec![10, 7, 7, 3, 5, 4, 8, 0],
        ];
        assert_eq!(instance.distances, reference);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join("wts_instance_test.csv");
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "0;0;5").unwrap();
            writeln!(file, "3;4;10").unwrap();
            writeln!(file, "6;8;1").unwrap();
        }

        let instance = Instance::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(instance.len(), 3);
        assert_eq!(instance.name, "wts_instance_test");
        assert_eq!(instance.distance(0, 1), 5);
        assert_eq!(instance.distance(0, 2), 10);
        assert_eq!(instance.weight(1), 10);
    }

    #[test]
    fn test_deserialized_instance_has_distances() {
        let original = tests_support::delta_instance();
        let json = serde_json::to_string(&original).unwrap();
        assert!(!json.contains("distances"));

        let restored: Instance = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.name, original.name);
        assert_eq!(restored.distances, original.distances);
        assert_eq!(restored.distance(0, 5), 14);
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let path = std::env::temp_dir().join("wts_instance_garbage.csv");
        std::fs::write(&path, "0;zero;5\n").unwrap();
        let result = Instance::from_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(SolverError::Parse(_))));
    }
}
