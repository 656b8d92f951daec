//! Weighted Tour Solver - Command Line Interface
//!
//! Builds a tour over a fixed share of the points and improves it with one of
//! the local searches or metaheuristics of the library.

use clap::{Parser, Subcommand, ValueEnum};
use weighted_tour_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use weighted_tour_solver::config::{ImproverConfig, StrategyKind};
use weighted_tour_solver::error::{Result, SolverError};
use weighted_tour_solver::heuristics::construction::{
    ConstructionHeuristic, GreedyCycle, NearestNeighbor, RegretInsertion,
};
use weighted_tour_solver::heuristics::neighborhood::NeighborhoodScope;
use weighted_tour_solver::instance::Instance;
use weighted_tour_solver::random::{random_tour, seeded_rng};
use weighted_tour_solver::solution::Solution;
use weighted_tour_solver::visualization::Visualizer;

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "weighted-tour-solver")]
#[command(version = "1.0")]
#[command(about = "Local search and metaheuristics for the weighted selective TSP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Search parameters shared by `solve` and `benchmark`
#[derive(clap::Args, Clone)]
struct SearchArgs {
    /// Neighborhood scope: node, edge or both
    #[arg(long, default_value = "edge")]
    scope: NeighborhoodScope,

    /// Inner search of a wrapper (g s c p, or o for none)
    #[arg(long, default_value = "s")]
    inner: String,

    /// Neighborhood scope of the inner search
    #[arg(long, default_value = "edge")]
    inner_scope: NeighborhoodScope,

    /// Candidate list length for candidate search
    #[arg(long, default_value = "10")]
    candidates: usize,

    /// Time limit in milliseconds for the time-bounded strategies
    #[arg(short, long, default_value = "1000")]
    time_limit_ms: u64,

    /// Random edits per ILS perturbation
    #[arg(long, default_value = "5")]
    perturbation: usize,

    /// Positions removed per LNS round
    #[arg(long, default_value = "20")]
    removal: usize,

    /// Genetic search population size
    #[arg(long, default_value = "20")]
    population: usize,

    /// Multi-start repeats
    #[arg(long, default_value = "10")]
    repeats: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,
}

impl SearchArgs {
    fn config(&self, strategy: StrategyKind, candidates: usize) -> Result<ImproverConfig> {
        let inner = if strategy.is_wrapper() {
            StrategyKind::parse_optional(&self.inner)?.map(|kind| ImproverConfig {
                candidates,
                ..ImproverConfig::local(kind, self.inner_scope)
            })
        } else {
            None
        };
        Ok(ImproverConfig {
            strategy,
            scope: self.scope,
            candidates,
            time_limit_ms: Some(self.time_limit_ms),
            perturbation_size: self.perturbation,
            removal_size: self.removal,
            population_size: self.population,
            repeats: self.repeats,
            seed: self.seed,
            inner: inner.map(Box::new),
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build and improve a tour on one instance
    Solve {
        /// Path to the instance file (x;y;weight per line)
        #[arg(short, long)]
        instance: PathBuf,

        /// Strategy: g s c p m i l e a or its long name
        #[arg(short, long, default_value = "s")]
        strategy: StrategyKind,

        /// JSON configuration file; overrides the search flags
        #[arg(long)]
        config: Option<PathBuf>,

        /// How the initial tour is built
        #[arg(long, value_enum, default_value = "random")]
        init: InitialTour,

        /// Start point for the construction heuristics
        #[arg(long, default_value = "0")]
        start: usize,

        /// Number of visited points (half the points, rounded up, by default)
        #[arg(long)]
        visit: Option<usize>,

        #[command(flatten)]
        search: SearchArgs,

        /// Output solution file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the solution as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Generate SVG visualization
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Score a solution file against an instance
    Evaluate {
        #[arg(short, long)]
        instance: PathBuf,

        #[arg(short = 'f', long)]
        solution: PathBuf,

        /// The file ends with an elapsed-time line
        #[arg(long)]
        timed: bool,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Comma-separated strategies to compare
        #[arg(long, default_value = "s,c,p")]
        strategies: String,

        /// Number of runs per strategy
        #[arg(short, long, default_value = "20")]
        runs: usize,

        /// Share of the points each tour visits
        #[arg(long, default_value = "0.5")]
        visit_fraction: f64,

        /// Save every solution file
        #[arg(long)]
        save: bool,

        #[command(flatten)]
        search: SearchArgs,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum InitialTour {
    /// Uniformly random points in random order
    Random,
    /// Nearest neighbor construction
    Nearest,
    /// Greedy cycle construction
    Greedy,
    /// Weighted 2-regret construction
    Regret,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve { instance, strategy, config, init, start, visit, search, output, json, svg } => {
            solve_instance(&instance, strategy, config, init, start, visit, &search, output, json, svg)
        }
        Commands::Evaluate { instance, solution, timed } => evaluate_solution(&instance, &solution, timed),
        Commands::Benchmark { dir, output, strategies, runs, visit_fraction, save, search, max_size } => {
            run_benchmark(&dir, &output, &strategies, runs, visit_fraction, save, &search, max_size)
        }
        Commands::Analyze { instance } => analyze_instance(&instance),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_instance(path: &Path) -> Result<Instance> {
    println!("Loading instance from {:?}...", path);
    Instance::from_file(path)
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    path: &Path,
    strategy: StrategyKind,
    config_path: Option<PathBuf>,
    init: InitialTour,
    start: usize,
    visit: Option<usize>,
    search: &SearchArgs,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
    svg: Option<PathBuf>,
) -> Result<()> {
    let instance = load_instance(path)?;
    if instance.is_empty() {
        return Err(SolverError::Parse("Instance has no points".to_string()));
    }

    let config = match config_path {
        Some(file) => ImproverConfig::from_file(file)?,
        None => search.config(strategy, search.candidates)?,
    };
    let improver = config.build(&instance)?;

    let target = visit.unwrap_or_else(|| instance.default_visit_count()).min(instance.len());
    let start = start % instance.len();
    let mut rng = seeded_rng(config.seed);
    let tour = match init {
        InitialTour::Random => random_tour(instance.len(), target, &mut rng),
        InitialTour::Nearest => NearestNeighbor.construct(&instance, start, target),
        InitialTour::Greedy => GreedyCycle.construct(&instance, start, target),
        InitialTour::Regret => RegretInsertion::new().construct(&instance, start, target),
    };
    let mut solution = Solution::from_tour(&instance, tour, improver.name());
    println!("Initial tour ({:?}): score {}", init, solution.score);

    println!("Improving with {}...", improver.name());
    let timer = Instant::now();
    improver.improve(&instance, &mut solution, &mut rng)?;
    let elapsed = timer.elapsed();
    solution.computation_time = elapsed.as_secs_f64();

    println!("\n{}", solution);
    log::info!("{} finished with score {} in {:?}", improver.name(), solution.score, elapsed);

    if let Some(out) = output {
        solution.write_to(&out, Some(elapsed.as_micros()))?;
        println!("Solution saved to {:?}", out);
    }
    if let Some(out) = json {
        std::fs::write(&out, serde_json::to_string_pretty(&solution)?)?;
        println!("JSON saved to {:?}", out);
    }
    if let Some(out) = svg {
        Visualizer::new().save_svg(&instance, &solution, &out)?;
        println!("Visualization saved to {:?}", out);
    }
    Ok(())
}

fn evaluate_solution(instance_path: &Path, solution_path: &Path, timed: bool) -> Result<()> {
    let instance = load_instance(instance_path)?;
    let solution = Solution::read_from(solution_path, &instance, timed)?;
    println!("Visited: {}/{}", solution.tour.len(), instance.len());
    println!("Score: {}", solution.score);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_benchmark(
    dir: &Path,
    output: &Path,
    strategies: &str,
    runs: usize,
    visit_fraction: f64,
    save: bool,
    search: &SearchArgs,
    max_size: Option<usize>,
) -> Result<()> {
    println!("Loading instances from {:?}...", dir);
    let mut instances = load_instances_from_dir(dir)?;
    if let Some(max) = max_size {
        instances.retain(|i| i.len() <= max);
    }
    if instances.is_empty() {
        return Err(SolverError::Configuration(format!("No instances found in {:?}", dir)));
    }

    let kinds = strategies
        .split(',')
        .map(|s| s.trim().parse::<StrategyKind>())
        .collect::<Result<Vec<_>>>()?;

    println!("Found {} instances, {} strategies", instances.len(), kinds.len());
    std::fs::create_dir_all(output)?;

    let config = BenchmarkConfig {
        runs,
        visit_fraction,
        seed: search.seed,
        output_dir: output.to_string_lossy().to_string(),
        save_solutions: save,
        ..Default::default()
    };
    let mut benchmark = Benchmark::new(config);

    for instance in &instances {
        // Candidate lists cannot be longer than the instance allows
        let candidates = search.candidates.min(instance.len().saturating_sub(1)).max(1);
        for &kind in &kinds {
            let improver_config = search.config(kind, candidates)?;
            benchmark.run(instance, &kind.to_string(), &improver_config)?;
        }
    }

    benchmark.export_to_csv(output.join("results.csv"))?;
    benchmark.export_statistics_csv(output.join("statistics.csv"))?;
    let report = benchmark.generate_report();
    std::fs::write(output.join("report.txt"), &report)?;

    println!("{}", report);
    println!("Results saved to {:?}", output);
    Ok(())
}

fn analyze_instance(path: &Path) -> Result<()> {
    let instance = load_instance(path)?;
    println!("{}", instance.statistics());
    Ok(())
}
