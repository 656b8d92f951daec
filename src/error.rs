//! Error types for the improvement engine.

use thiserror::Error;

/// Main error type for solver operations
#[derive(Debug, Error)]
pub enum SolverError {
    /// Invalid strategy / scope combination, out-of-range parameter or unknown selector
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Point count does not fit the packed move operands
    #[error("Too many points: {points}, max is {max}")]
    Capacity { points: usize, max: usize },

    /// A forbidden move reached evaluation or application (engine bug)
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed instance or solution file
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias for solver operations
pub type Result<T> = std::result::Result<T, SolverError>;
