//! Benchmarking and experimentation module.
//!
//! Runs a configured improver from several greedy-cycle start tours,
//! collects one [`AlgorithmResult`] per run and aggregates them into
//! per-(instance, algorithm) statistics.

use crate::config::ImproverConfig;
use crate::error::Result;
use crate::heuristics::construction::{ConstructionHeuristic, GreedyCycle};
use crate::instance::Instance;
use crate::random::seeded_rng;
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of running a single algorithm once on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm label
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Number of points in the instance
    pub points: usize,
    /// Number of visited points
    pub visited: usize,
    /// Start point of the initial tour
    pub start: usize,
    /// Final score
    pub score: i64,
    /// Computation time in seconds
    pub time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

/// Aggregated statistics for one algorithm on one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    pub instance: String,
    pub runs: usize,
    pub min_score: f64,
    pub max_score: f64,
    pub mean_score: f64,
    pub std_score: f64,
    pub avg_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Number of runs per algorithm
    pub runs: usize,
    /// Start points for the initial tours; evenly spread over the instance when empty
    pub start_indices: Vec<usize>,
    /// Share of the points each tour visits
    pub visit_fraction: f64,
    /// Base seed, run `r` uses `seed + r` (wrapping)
    pub seed: u64,
    /// Output directory
    pub output_dir: String,
    /// Save every solution file
    pub save_solutions: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            runs: 20,
            start_indices: Vec::new(),
            visit_fraction: 0.5,
            seed: 0,
            output_dir: "results".to_string(),
            save_solutions: false,
        }
    }
}

impl BenchmarkConfig {
    /// Number of points each tour visits on `instance`
    pub fn visit_count(&self, instance: &Instance) -> usize {
        let n = instance.len();
        ((n as f64 * self.visit_fraction).ceil() as usize).min(n)
    }

    /// Start point of every run
    pub fn starts(&self, instance: &Instance) -> Vec<usize> {
        let n = instance.len().max(1);
        (0..self.runs)
            .map(|run| match self.start_indices.get(run) {
                Some(&start) => start % n,
                None => run * n / self.runs.max(1),
            })
            .collect()
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
    show_progress: bool,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            show_progress: true,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn progress_bar(&self, len: usize, message: String) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(message);
        pb
    }

    /// Run the configured improver once per start point on `instance`
    pub fn run(&mut self, instance: &Instance, label: &str, improver_config: &ImproverConfig) -> Result<()> {
        let improver = improver_config.build(instance)?;
        let visited = self.config.visit_count(instance);
        let starts = self.config.starts(instance);

        log::info!("Benchmarking {} on {} ({} runs)", label, instance.name, starts.len());
        let pb = self.progress_bar(starts.len(), format!("{} / {}", instance.name, label));

        for (run, &start) in starts.iter().enumerate() {
            let tour = GreedyCycle.construct(instance, start, visited);
            let mut solution = Solution::from_tour(instance, tour, label);
            let mut rng = seeded_rng(self.config.seed.wrapping_add(run as u64));

            let timer = Instant::now();
            improver.improve(instance, &mut solution, &mut rng)?;
            let elapsed = timer.elapsed();
            solution.computation_time = elapsed.as_secs_f64();

            if self.config.save_solutions {
                solution.write_to(self.solution_path(instance, label, start), Some(elapsed.as_micros()))?;
            }

            self.results.push(AlgorithmResult {
                algorithm: label.to_string(),
                instance: instance.name.clone(),
                points: instance.len(),
                visited: solution.tour.len(),
                start,
                score: solution.score,
                time: solution.computation_time,
                iterations: solution.iterations,
            });
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(())
    }

    fn solution_path(&self, instance: &Instance, label: &str, start: usize) -> PathBuf {
        Path::new(&self.config.output_dir).join(format!("{}-{}-{}.txt", instance.name, label, start))
    }

    /// Compute statistics for each (instance, algorithm) pair, best mean first
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut groups: BTreeMap<(String, String), Vec<&AlgorithmResult>> = BTreeMap::new();
        for result in &self.results {
            groups
                .entry((result.instance.clone(), result.algorithm.clone()))
                .or_default()
                .push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = groups
            .into_iter()
            .map(|((instance, algorithm), results)| {
                let scores: Vec<f64> = results.iter().map(|r| r.score as f64).collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();
                let std_score = if scores.len() > 1 {
                    Statistics::std_dev(&scores)
                } else {
                    0.0
                };
                AlgorithmStatistics {
                    algorithm,
                    instance,
                    runs: results.len(),
                    min_score: Statistics::min(&scores),
                    max_score: Statistics::max(&scores),
                    mean_score: Statistics::mean(&scores),
                    std_score,
                    avg_time: Statistics::mean(&times),
                }
            })
            .collect();

        statistics.sort_by_key(|s| (s.instance.clone(), OrderedFloat(s.mean_score)));
        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for result in &self.results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("   Weighted Tour Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));

        report.push_str(&format!(
            "{:<20} {:<30} {:>6} {:>10} {:>12} {:>10} {:>10} {:>10}\n",
            "Instance", "Algorithm", "Runs", "Min", "Mean", "Max", "Std", "Avg Time"
        ));
        report.push_str(&"-".repeat(116));
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<20} {:<30} {:>6} {:>10.0} {:>12.2} {:>10.0} {:>10.2} {:>10.4}\n",
                stat.instance,
                stat.algorithm,
                stat.runs,
                stat.min_score,
                stat.mean_score,
                stat.max_score,
                stat.std_score,
                stat.avg_time
            ));
        }

        report.push_str(&"-".repeat(116));
        report.push('\n');
        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

/// Load every instance file (`.csv`) from a directory, smallest first
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Instance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "csv").unwrap_or(false) {
            match Instance::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }
    }

    instances.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.name.cmp(&b.name)));
    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyKind;
    use crate::heuristics::neighborhood::NeighborhoodScope;
    use crate::instance::tests_support::scattered_instance;

    fn quick_config(runs: usize) -> BenchmarkConfig {
        BenchmarkConfig {
            runs,
            output_dir: std::env::temp_dir().to_string_lossy().to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.runs, 20);
        let instance = scattered_instance(11);
        assert_eq!(config.visit_count(&instance), 6);
    }

    #[test]
    fn test_starts_are_spread_or_explicit() {
        let instance = scattered_instance(20);
        let spread = quick_config(4).starts(&instance);
        assert_eq!(spread, vec![0, 5, 10, 15]);

        let explicit = BenchmarkConfig {
            start_indices: vec![3, 25],
            ..quick_config(3)
        };
        assert_eq!(explicit.starts(&instance), vec![3, 5, 13]);
    }

    #[test]
    fn test_run_records_results_and_statistics() {
        let instance = scattered_instance(20);
        let mut benchmark = Benchmark::new(quick_config(3)).quiet();
        let steepest = ImproverConfig::local(StrategyKind::Steepest, NeighborhoodScope::Edge);
        let greedy = ImproverConfig::local(StrategyKind::Greedy, NeighborhoodScope::Both);

        benchmark.run(&instance, "steepest", &steepest).unwrap();
        benchmark.run(&instance, "greedy", &greedy).unwrap();

        assert_eq!(benchmark.results().len(), 6);
        assert!(benchmark.results().iter().all(|r| r.visited == 10));

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 2);
        for stat in &stats {
            assert_eq!(stat.runs, 3);
            assert!(stat.min_score <= stat.mean_score && stat.mean_score <= stat.max_score);
            assert!(stat.std_score >= 0.0);
        }
        assert!(stats[0].mean_score <= stats[1].mean_score);

        let report = benchmark.generate_report();
        assert!(report.contains("steepest"));
        assert!(report.contains(&instance.name));
    }

    #[test]
    fn test_largest_seed_wraps_around() {
        let instance = scattered_instance(12);
        let config = BenchmarkConfig {
            seed: u64::MAX,
            ..quick_config(2)
        };
        let mut benchmark = Benchmark::new(config).quiet();
        let greedy = ImproverConfig::local(StrategyKind::Greedy, NeighborhoodScope::Edge);

        benchmark.run(&instance, "greedy", &greedy).unwrap();

        assert_eq!(benchmark.results().len(), 2);
    }

    #[test]
    fn test_saved_solutions_read_back() {
        let instance = scattered_instance(12);
        let dir = std::env::temp_dir().join("wts_benchmark_test");
        std::fs::create_dir_all(&dir).unwrap();
        let config = BenchmarkConfig {
            runs: 1,
            save_solutions: true,
            output_dir: dir.to_string_lossy().to_string(),
            ..Default::default()
        };
        let mut benchmark = Benchmark::new(config).quiet();
        let lazy = ImproverConfig::local(StrategyKind::LazySteepest, NeighborhoodScope::Edge);

        benchmark.run(&instance, "lazy", &lazy).unwrap();

        let path = dir.join(format!("{}-lazy-0.txt", instance.name));
        let loaded = Solution::read_from(&path, &instance, true).unwrap();
        assert_eq!(loaded.score, benchmark.results()[0].score);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_csv_export() {
        let instance = scattered_instance(10);
        let mut benchmark = Benchmark::new(quick_config(2)).quiet();
        let steepest = ImproverConfig::local(StrategyKind::Steepest, NeighborhoodScope::Node);
        benchmark.run(&instance, "node", &steepest).unwrap();

        let path = std::env::temp_dir().join("wts_benchmark_results.csv");
        benchmark.export_to_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(text.starts_with("algorithm,instance,points,visited,start,score,time,iterations"));
        assert_eq!(text.lines().count(), 3);
    }
}
