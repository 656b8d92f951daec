//! Search heuristics for the weighted selective tour problem.
//!
//! Construction and repair, the swap-move neighborhood with its delta
//! evaluation, local search and the time-bounded metaheuristics built on it.

pub mod construction;
pub mod delta;
pub mod genetic;
pub mod iterated;
pub mod large_neighborhood;
pub mod local_search;
pub mod moves;
pub mod multi_start;
pub mod neighborhood;

pub use construction::*;
pub use genetic::*;
pub use iterated::*;
pub use large_neighborhood::*;
pub use local_search::*;
pub use moves::*;
pub use multi_start::*;
pub use neighborhood::*;
