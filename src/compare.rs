//! Algorithm comparison on a single instance.
//!
//! Runs every algorithm several times with different seeds, collects one
//! row per run, aggregates statistics and exports both tables to CSV.

use crate::config::{AlgorithmKind, SolverConfig};
use crate::error::{Error, Result};
use crate::instance::RouteInstance;
use crate::planner::RoutePlanner;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    pub algorithm: String,
    pub instance: String,
    pub stops: usize,
    pub run: usize,
    pub seed: u64,
    pub distance_km: f64,
    pub closed: bool,
    pub complete: bool,
    pub time: f64,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    pub runs: usize,
    pub best_km: f64,
    pub mean_km: f64,
    pub std_km: f64,
    pub worst_km: f64,
    pub mean_time: f64,
}

#[derive(Debug, Clone)]
pub struct CompareConfig {
    /// Runs per algorithm, seeded `0..runs`
    pub runs: usize,
    pub algorithms: Vec<AlgorithmKind>,
    pub show_progress: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        CompareConfig {
            runs: 10,
            algorithms: AlgorithmKind::ALL.to_vec(),
            show_progress: true,
        }
    }
}

pub struct Comparison {
    config: CompareConfig,
    planner: RoutePlanner,
    results: Vec<AlgorithmResult>,
}

impl Comparison {
    pub fn new(config: CompareConfig, solver: SolverConfig) -> Self {
        Comparison {
            config,
            planner: RoutePlanner::new(solver),
            results: Vec::new(),
        }
    }

    pub fn run(&mut self, instance: &RouteInstance) -> Result<()> {
        if self.config.runs == 0 {
            return Err(Error::invalid_input("number of runs must be at least 1"));
        }
        if self.config.algorithms.is_empty() {
            return Err(Error::invalid_input("no algorithms to compare"));
        }

        let total = (self.config.runs * self.config.algorithms.len()) as u64;
        let progress = if self.config.show_progress {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        log::info!("Comparing {} algorithms on {}", self.config.algorithms.len(), instance.name);

        for &kind in &self.config.algorithms {
            progress.set_message(kind.label());
            for run in 0..self.config.runs {
                let seed = run as u64;
                let route = self.planner.run(kind, instance, seed);
                self.results.push(AlgorithmResult {
                    algorithm: route.algorithm.clone(),
                    instance: instance.name.clone(),
                    stops: instance.len(),
                    run,
                    seed,
                    distance_km: route.distance_km,
                    closed: route.closed,
                    complete: route.complete,
                    time: route.computation_time,
                });
                progress.inc(1);
            }
        }

        progress.finish_and_clear();
        Ok(())
    }

    /// Per-algorithm statistics over complete routes, in run order
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut names: Vec<&str> = Vec::new();
        for r in &self.results {
            if !names.contains(&r.algorithm.as_str()) {
                names.push(&r.algorithm);
            }
        }

        names
            .into_iter()
            .filter_map(|name| {
                let rows: Vec<&AlgorithmResult> = self
                    .results
                    .iter()
                    .filter(|r| r.algorithm == name && r.complete)
                    .collect();
                if rows.is_empty() {
                    return None;
                }

                let distances: Vec<f64> = rows.iter().map(|r| r.distance_km).collect();
                let times: Vec<f64> = rows.iter().map(|r| r.time).collect();
                let std_km = if distances.len() > 1 { distances.iter().std_dev() } else { 0.0 };

                Some(AlgorithmStatistics {
                    algorithm: name.to_string(),
                    runs: rows.len(),
                    best_km: distances.iter().cloned().fold(f64::INFINITY, f64::min),
                    mean_km: distances.iter().mean(),
                    std_km,
                    worst_km: distances.iter().cloned().fold(0.0, f64::max),
                    mean_time: times.iter().mean(),
                })
            })
            .collect()
    }

    /// Export all results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "{:<28} {:>6} {:>10} {:>10} {:>8} {:>10} {:>10}\n",
            "Algorithm", "Runs", "Best", "Mean", "Std", "Worst", "Avg Time"
        ));
        report.push_str(&"-".repeat(88));
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<28} {:>6} {:>10.3} {:>10.3} {:>8.3} {:>10.3} {:>10.4}\n",
                stat.algorithm, stat.runs, stat.best_km, stat.mean_km, stat.std_km, stat.worst_km, stat.mean_time
            ));
        }

        report
    }

    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}
