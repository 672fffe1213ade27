//! Driving a simulation for a fixed number of chronons.

use crate::simulation::Simulation;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use wator_core::{PopulationHistory, PopulationStats, Result, RunConfig, SimulationConfig};

/// Upper bound on history samples reserved before a run starts
const MAX_PREALLOCATED_SAMPLES: u64 = 100_000;

/// Outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub final_stats: PopulationStats,
    pub history: PopulationHistory,
    pub workers: usize,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn chronons_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.history.len() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Run `config.duration` chronons.
pub fn run(simulation: &Simulation, config: &RunConfig) -> RunReport {
    run_with(simulation, config, |_| {})
}

/// Run `config.duration` chronons, calling `on_report` with the population
/// after every `config.report_interval`-th chronon.
#[instrument(skip_all, fields(duration = config.duration, workers = config.workers))]
pub fn run_with<F>(simulation: &Simulation, config: &RunConfig, mut on_report: F) -> RunReport
where
    F: FnMut(&PopulationStats),
{
    info!("Starting run for {} chronons", config.duration);

    let mut history = PopulationHistory::with_capacity(preallocated_samples(config.duration));
    let start = Instant::now();

    for i in 0..config.duration {
        simulation.step_parallel(config.workers);
        let stats = simulation.stats();
        history.record(stats);

        if config.report_interval > 0 && i % config.report_interval == 0 {
            info!(
                event = "population_report",
                chronon = stats.chronon,
                fish = stats.fish,
                sharks = stats.sharks,
                "Population report"
            );
            on_report(&stats);
        }
    }

    let report = RunReport {
        final_stats: simulation.stats(),
        history,
        workers: config.workers,
        elapsed: start.elapsed(),
    };
    emit_run_summary(&report);
    report
}

fn preallocated_samples(duration: u64) -> usize {
    duration.min(MAX_PREALLOCATED_SAMPLES) as usize
}

fn emit_run_summary(report: &RunReport) {
    let (mean_fish, mean_sharks) = report.history.mean_population().unwrap_or_default();

    info!(
        event = "run_summary",
        chronons = report.history.len(),
        final_fish = report.final_stats.fish,
        final_sharks = report.final_stats.sharks,
        final_total = report.final_stats.total(),
        predator_ratio = ?report.final_stats.predator_ratio(),
        peak_fish = report.history.peak_fish().map(|s| s.fish).unwrap_or(0),
        peak_sharks = report.history.peak_sharks().map(|s| s.sharks).unwrap_or(0),
        mean_fish = format!("{:.1}", mean_fish),
        mean_sharks = format!("{:.1}", mean_sharks),
        fish_extinct_at = ?report.history.fish_extinct_at(),
        sharks_extinct_at = ?report.history.sharks_extinct_at(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        chronons_per_second = format!("{:.2}", report.chronons_per_second()),
        "Run complete"
    );
}

/// Timing of one benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub workers: usize,
    pub elapsed: Duration,
    pub chronons_per_second: f64,
    pub final_stats: PopulationStats,
}

impl BenchmarkResult {
    /// Throughput relative to `baseline`
    pub fn speedup_over(&self, baseline: &BenchmarkResult) -> f64 {
        if baseline.chronons_per_second > 0.0 {
            self.chronons_per_second / baseline.chronons_per_second
        } else {
            0.0
        }
    }
}

/// World used by the built-in throughput benchmark
pub fn benchmark_config() -> SimulationConfig {
    SimulationConfig {
        grid_size: 30,
        initial_fish: 200,
        initial_sharks: 40,
        fish_breed_age: 4,
        shark_breed_age: 8,
        shark_starve_time: 10,
        ..Default::default()
    }
}

/// Run a fresh world built from `config` for `duration` chronons once per
/// entry of `worker_counts`.
#[instrument(skip(config))]
pub fn benchmark(
    config: &SimulationConfig,
    duration: u64,
    worker_counts: &[usize],
) -> Result<Vec<BenchmarkResult>> {
    let mut results = Vec::with_capacity(worker_counts.len());

    for &workers in worker_counts {
        let simulation = Simulation::new(config.clone())?;
        let report = run(
            &simulation,
            &RunConfig {
                duration,
                workers,
                report_interval: 0,
            },
        );

        info!(
            event = "benchmark_result",
            workers,
            elapsed_ms = report.elapsed.as_millis() as u64,
            chronons_per_second = format!("{:.2}", report.chronons_per_second()),
            "Benchmark configuration finished"
        );

        results.push(BenchmarkResult {
            workers,
            elapsed: report.elapsed,
            chronons_per_second: report.chronons_per_second(),
            final_stats: report.final_stats,
        });
    }

    Ok(results)
}
