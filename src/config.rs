//! Search configuration and the improver factory.
//!
//! [`ImproverConfig`] carries every value the engine consumes. It can be
//! written by hand, loaded from JSON, or filled from the command line, and
//! [`ImproverConfig::build`] turns it into a ready [`Improver`]. Every invalid
//! combination is reported there, before any search starts.

use crate::error::{Result, SolverError};
use crate::heuristics::genetic::{Crossover, GeneticLocalSearch};
use crate::heuristics::iterated::IteratedLocalSearch;
use crate::heuristics::large_neighborhood::LargeNeighborhoodSearch;
use crate::heuristics::local_search::{GreedySearch, Improver, LazySteepestSearch, SteepestSearch};
use crate::heuristics::multi_start::MultiStart;
use crate::heuristics::neighborhood::{check_capacity, NeighborhoodScope};
use crate::instance::Instance;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Every search strategy the factory can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Greedy,
    Steepest,
    CandidateSteepest,
    LazySteepest,
    MultiStart,
    IteratedLocalSearch,
    LargeNeighborhood,
    Genetic,
    AlternativeGenetic,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 9] = [
        StrategyKind::Greedy,
        StrategyKind::Steepest,
        StrategyKind::CandidateSteepest,
        StrategyKind::LazySteepest,
        StrategyKind::MultiStart,
        StrategyKind::IteratedLocalSearch,
        StrategyKind::LargeNeighborhood,
        StrategyKind::Genetic,
        StrategyKind::AlternativeGenetic,
    ];

    /// One-letter selector
    pub fn code(self) -> char {
        match self {
            StrategyKind::Greedy => 'g',
            StrategyKind::Steepest => 's',
            StrategyKind::CandidateSteepest => 'c',
            StrategyKind::LazySteepest => 'p',
            StrategyKind::MultiStart => 'm',
            StrategyKind::IteratedLocalSearch => 'i',
            StrategyKind::LargeNeighborhood => 'l',
            StrategyKind::Genetic => 'e',
            StrategyKind::AlternativeGenetic => 'a',
        }
    }

    /// Wrappers that nest another search
    pub fn is_wrapper(self) -> bool {
        matches!(
            self,
            StrategyKind::MultiStart
                | StrategyKind::IteratedLocalSearch
                | StrategyKind::LargeNeighborhood
                | StrategyKind::Genetic
                | StrategyKind::AlternativeGenetic
        )
    }

    /// Parse a sub-strategy selector, where `o` or `none` means no inner search
    pub fn parse_optional(s: &str) -> Result<Option<Self>> {
        match s.to_ascii_lowercase().as_str() {
            "o" | "none" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "g" | "greedy" => Ok(StrategyKind::Greedy),
            "s" | "steepest" => Ok(StrategyKind::Steepest),
            "c" | "candidate" | "candidate-steepest" => Ok(StrategyKind::CandidateSteepest),
            "p" | "lazy" | "lazy-steepest" => Ok(StrategyKind::LazySteepest),
            "m" | "multi-start" | "msls" => Ok(StrategyKind::MultiStart),
            "i" | "ils" | "iterated-local-search" => Ok(StrategyKind::IteratedLocalSearch),
            "l" | "lns" | "large-neighborhood" => Ok(StrategyKind::LargeNeighborhood),
            "e" | "genetic" => Ok(StrategyKind::Genetic),
            "a" | "alternative-genetic" => Ok(StrategyKind::AlternativeGenetic),
            other => Err(SolverError::Configuration(format!("Invalid improver name: {}", other))),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StrategyKind::Greedy => "greedy",
            StrategyKind::Steepest => "steepest",
            StrategyKind::CandidateSteepest => "candidate-steepest",
            StrategyKind::LazySteepest => "lazy-steepest",
            StrategyKind::MultiStart => "multi-start",
            StrategyKind::IteratedLocalSearch => "iterated-local-search",
            StrategyKind::LargeNeighborhood => "large-neighborhood",
            StrategyKind::Genetic => "genetic",
            StrategyKind::AlternativeGenetic => "alternative-genetic",
        };
        write!(f, "{}", name)
    }
}

/// Improver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImproverConfig {
    /// Strategy to build
    pub strategy: StrategyKind,
    /// Which swap moves the neighborhood contains
    pub scope: NeighborhoodScope,
    /// Candidate list length for the candidate-restricted search
    pub candidates: usize,
    /// Wall-clock budget in milliseconds; required by ILS, LNS and genetic search
    pub time_limit_ms: Option<u64>,
    /// Random edits per ILS perturbation
    pub perturbation_size: usize,
    /// Positions removed per LNS round
    pub removal_size: usize,
    /// Genetic search population size
    pub population_size: usize,
    /// Multi-start repeats
    pub repeats: usize,
    /// Base seed for multi-start reseeding
    pub seed: u64,
    /// Search nested inside a wrapper
    pub inner: Option<Box<ImproverConfig>>,
}

impl Default for ImproverConfig {
    fn default() -> Self {
        ImproverConfig {
            strategy: StrategyKind::Steepest,
            scope: NeighborhoodScope::Edge,
            candidates: 10,
            time_limit_ms: Some(1000),
            perturbation_size: 5,
            removal_size: 20,
            population_size: 20,
            repeats: 10,
            seed: 42,
            inner: None,
        }
    }
}

impl ImproverConfig {
    /// Plain local search of the given kind
    pub fn local(strategy: StrategyKind, scope: NeighborhoodScope) -> Self {
        ImproverConfig {
            strategy,
            scope,
            ..Default::default()
        }
    }

    /// Wrapper around `inner`
    pub fn wrapping(strategy: StrategyKind, inner: Option<ImproverConfig>) -> Self {
        ImproverConfig {
            strategy,
            inner: inner.map(Box::new),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn time_limit(&self) -> Result<Duration> {
        self.time_limit_ms.map(Duration::from_millis).ok_or_else(|| {
            SolverError::Configuration(format!("{} needs a time limit", self.strategy))
        })
    }

    fn build_inner(&self, instance: &Instance) -> Result<Option<Box<dyn Improver>>> {
        self.inner.as_ref().map(|inner| inner.build(instance)).transpose()
    }

    fn require_inner(&self, instance: &Instance) -> Result<Box<dyn Improver>> {
        self.build_inner(instance)?.ok_or_else(|| {
            SolverError::Configuration(format!("{} needs an inner search", self.strategy))
        })
    }

    fn require_positive(&self, value: usize, what: &str) -> Result<()> {
        if value == 0 {
            return Err(SolverError::Configuration(format!("{} needs a positive {}", self.strategy, what)));
        }
        Ok(())
    }

    /// Build the configured improver, validating every parameter
    pub fn build(&self, instance: &Instance) -> Result<Box<dyn Improver>> {
        check_capacity(instance.len())?;

        let improver: Box<dyn Improver> = match self.strategy {
            StrategyKind::Greedy => Box::new(GreedySearch::new(self.scope)),
            StrategyKind::Steepest => Box::new(SteepestSearch::new(self.scope)),
            StrategyKind::CandidateSteepest => {
                Box::new(SteepestSearch::with_candidates(instance, self.scope, self.candidates)?)
            }
            StrategyKind::LazySteepest => Box::new(LazySteepestSearch::new(self.scope)?),
            StrategyKind::MultiStart => {
                self.require_positive(self.repeats, "repeat count")?;
                let search = MultiStart::new(self.require_inner(instance)?, self.repeats, self.seed);
                match self.time_limit_ms {
                    Some(ms) => Box::new(search.with_time_limit(Duration::from_millis(ms))),
                    None => Box::new(search),
                }
            }
            StrategyKind::IteratedLocalSearch => {
                self.require_positive(self.perturbation_size, "perturbation size")?;
                Box::new(IteratedLocalSearch::new(
                    self.require_inner(instance)?,
                    self.perturbation_size,
                    self.time_limit()?,
                ))
            }
            StrategyKind::LargeNeighborhood => {
                self.require_positive(self.removal_size, "removal size")?;
                Box::new(LargeNeighborhoodSearch::new(
                    self.build_inner(instance)?,
                    self.removal_size,
                    self.time_limit()?,
                ))
            }
            StrategyKind::Genetic | StrategyKind::AlternativeGenetic => {
                if self.population_size < 2 {
                    return Err(SolverError::Configuration(
                        "Genetic search needs a population of at least 2".to_string(),
                    ));
                }
                let crossover = if self.strategy == StrategyKind::Genetic {
                    Crossover::EdgeRecombination
                } else {
                    Crossover::WeightPreference
                };
                Box::new(GeneticLocalSearch::new(
                    self.build_inner(instance)?,
                    self.population_size,
                    crossover,
                    self.time_limit()?,
                ))
            }
        };

        log::debug!("built {} ({}, scope {})", improver.name(), self.strategy, self.scope);
        Ok(improver)
    }
}
