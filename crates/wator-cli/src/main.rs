//! Command-line driver for the Wa-Tor simulation.

mod telemetry;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use telemetry::LogFormat;
use tracing::info;
use wator_core::{RunConfig, SimulationConfig};
use wator_world::{benchmark, benchmark_config, run_with, RunReport, Simulation};

#[derive(Parser)]
#[command(name = "wator")]
#[command(author, version, about = "Wa-Tor predator-prey simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log line format (logs are written to stderr)
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and print population statistics
    Run(RunArgs),

    /// Compare throughput across worker thread counts
    Bench(BenchArgs),
}

#[derive(Args)]
struct RunArgs {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Starting population of sharks
    #[arg(long)]
    sharks: Option<usize>,

    /// Starting population of fish
    #[arg(long)]
    fish: Option<usize>,

    /// Number of chronons before fish reproduce
    #[arg(long)]
    fishbreed: Option<u32>,

    /// Number of chronons before sharks reproduce
    #[arg(long)]
    sharkbreed: Option<u32>,

    /// Chronons before a shark starves
    #[arg(long)]
    starve: Option<i32>,

    /// Grid dimensions (size x size)
    #[arg(long)]
    grid: Option<i32>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads per phase
    #[arg(short, long, default_value = "1")]
    threads: usize,

    /// Number of chronons to simulate
    #[arg(short, long, default_value = "500")]
    duration: u64,

    /// Print statistics every this many chronons (0 disables)
    #[arg(long, default_value = "50")]
    report_interval: u64,
}

impl RunArgs {
    fn into_configs(self) -> Result<(SimulationConfig, RunConfig)> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_json_file(path)?,
            None => SimulationConfig::default(),
        };

        if let Some(sharks) = self.sharks {
            config.initial_sharks = sharks;
        }
        if let Some(fish) = self.fish {
            config.initial_fish = fish;
        }
        if let Some(age) = self.fishbreed {
            config.fish_breed_age = age;
        }
        if let Some(age) = self.sharkbreed {
            config.shark_breed_age = age;
        }
        if let Some(starve) = self.starve {
            config.shark_starve_time = starve;
        }
        if let Some(grid) = self.grid {
            config.grid_size = grid;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;

        let run_config = RunConfig {
            duration: self.duration,
            workers: self.threads,
            report_interval: self.report_interval,
        };

        Ok((config, run_config))
    }
}

#[derive(Args)]
struct BenchArgs {
    /// Comma-separated worker thread counts to compare
    #[arg(long, value_delimiter = ',', default_value = "1,2,4,8")]
    threads: Vec<usize>,

    /// Chronons per configuration
    #[arg(short, long, default_value = "50")]
    duration: u64,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_telemetry(cli.log_format)?;

    match cli.command {
        Commands::Run(args) => run_simulation(args),
        Commands::Bench(args) => run_benchmark(args),
    }
}

fn run_simulation(args: RunArgs) -> Result<()> {
    let (config, run_config) = args.into_configs()?;

    println!("=== Wa-Tor Simulation ===");
    println!("Grid Size: {} x {}", config.grid_size, config.grid_size);
    println!(
        "Initial Fish: {}, Sharks: {}",
        config.initial_fish, config.initial_sharks
    );
    println!(
        "Fish Breed Age: {}, Shark Breed Age: {}",
        config.fish_breed_age, config.shark_breed_age
    );
    println!("Shark Starve Time: {}", config.shark_starve_time);
    println!("Threads: {}", run_config.workers);
    println!("Duration: {} chronons\n", run_config.duration);

    let simulation = Simulation::new(config)?;
    info!("Simulation initialized");

    let report = run_with(&simulation, &run_config, |stats| println!("{}", stats));

    println!("\n=== Final Results ===");
    print!("{}", final_results(&report));

    Ok(())
}

fn final_results(report: &RunReport) -> String {
    let stats = &report.final_stats;
    let mut out = format!("{}\nTotal Population: {}\n", stats, stats.total());
    if let Some(ratio) = stats.predator_ratio() {
        out += &format!("Sharks per Fish: {:.3}\n", ratio);
    }
    if let Some(peak) = report.history.peak_fish() {
        out += &format!("Peak Fish: {} (chronon {})\n", peak.fish, peak.chronon);
    }
    if let Some(peak) = report.history.peak_sharks() {
        out += &format!("Peak Sharks: {} (chronon {})\n", peak.sharks, peak.chronon);
    }
    if let Some(chronon) = report.history.fish_extinct_at() {
        out += &format!("Fish extinct at chronon {}\n", chronon);
    }
    if let Some(chronon) = report.history.sharks_extinct_at() {
        out += &format!("Sharks extinct at chronon {}\n", chronon);
    }
    out += &format!("Time elapsed: {:?}\n", report.elapsed);
    out += &format!("Chronons per second: {:.2}\n", report.chronons_per_second());
    out
}

fn run_benchmark(args: BenchArgs) -> Result<()> {
    let config = SimulationConfig {
        seed: args.seed,
        ..benchmark_config()
    };

    println!("=== Wa-Tor Concurrent Multithreading Benchmark ===\n");

    let results = benchmark(&config, args.duration, &args.threads)?;
    for result in &results {
        println!(
            "Threads: {} | Time: {:.2} ms | Chronons/sec: {:.2}",
            result.workers,
            result.elapsed.as_secs_f64() * 1000.0,
            result.chronons_per_second
        );
    }

    if let Some(baseline) = results.first() {
        println!("\n=== Speedup Analysis ===");
        for result in &results {
            println!(
                "Threads: {} | Speedup: {:.2}x",
                result.workers,
                result.speedup_over(baseline)
            );
        }
    }

    Ok(())
}
