//! Weighted Tour Solver Library
//!
//! Improvement engine for the weighted selective traveling salesman problem:
//! choose a fixed number of points out of a weighted point set and order them
//! into a cycle minimizing travel distance plus the weights of the chosen points.
//!
//! # Features
//!
//! - Swap-move neighborhood (node swap, 2-opt edge swap, outside replacement)
//!   with constant-time delta evaluation
//! - Greedy, steepest, candidate-list and lazy (priority queue) local search
//! - Multi-start, iterated local search, large neighborhood search and a
//!   steady-state genetic local search
//! - Construction heuristics, benchmarking and SVG visualization
//!
//! # Example
//!
//! ```no_run
//! use weighted_tour_solver::config::{ImproverConfig, StrategyKind};
//! use weighted_tour_solver::heuristics::construction::{ConstructionHeuristic, GreedyCycle};
//! use weighted_tour_solver::heuristics::neighborhood::NeighborhoodScope;
//! use weighted_tour_solver::instance::Instance;
//! use weighted_tour_solver::random::seeded_rng;
//! use weighted_tour_solver::solution::Solution;
//!
//! let instance = Instance::from_file("TSPA.csv").unwrap();
//! let tour = GreedyCycle.construct(&instance, 0, instance.default_visit_count());
//! let mut solution = Solution::from_tour(&instance, tour, "greedy-cycle");
//!
//! let config = ImproverConfig::local(StrategyKind::LazySteepest, NeighborhoodScope::Edge);
//! let improver = config.build(&instance).unwrap();
//! improver.improve(&instance, &mut solution, &mut seeded_rng(42)).unwrap();
//!
//! println!("Score: {}", solution.score);
//! ```

pub mod benchmark;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod instance;
pub mod random;
pub mod solution;
pub mod visualization;

pub use config::{ImproverConfig, StrategyKind};
pub use error::{Result, SolverError};
pub use heuristics::local_search::Improver;
pub use instance::Instance;
pub use solution::Solution;
