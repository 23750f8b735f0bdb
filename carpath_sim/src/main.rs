//! carpath Simulator CLI
//!
//! Run deterministic journey scenarios and optionally export playback frames.

use carpath_sim::scenarios::ScenarioId;
use carpath_sim::{ScenarioResult, ScenarioRunner, SimConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// carpath journey simulator
#[derive(Parser, Debug)]
#[command(name = "carpath-sim")]
#[command(about = "Animate a vehicle along a simulated driving route", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Scenario to run (nominal_drive, permission_denied, empty_directions,
    /// directions_failure, restart_journey, stale_completion, signal_loss, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Simulated duration in seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Points per synthetic route
    #[arg(long)]
    points: Option<usize>,

    /// JSON config file (flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export frames of a single scenario to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,
}

impl Args {
    /// Builds the run configuration from the file (if any) and flags.
    fn sim_config(&self) -> Result<SimConfig, carpath_sim::SimError> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_json_file(path)?,
            None => SimConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.journey.tick_interval_ms = tick_ms;
        }
        if let Some(points) = self.points {
            config.route_points = points;
        }
        if config.seed == 0 {
            config.seed = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42);
        }
        Ok(config)
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let config = match args.sim_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    if !args.json {
        info!("carpath simulator v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "{} -> {} every {} ms",
            config.journey.origin, config.journey.destination, config.journey.tick_interval_ms
        );
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Available scenarios: nominal_drive, permission_denied, empty_directions, directions_failure, restart_journey, stale_completion, signal_loss, all");
                std::process::exit(2);
            }
        }
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(2);
        }

        let runner = ScenarioRunner::new(config.clone());
        match runner.run_with_export(scenarios[0], export_path) {
            Ok(result) if result.passed => {
                info!(
                    "✓ {} (seed={}) PASSED - exported to {}",
                    scenarios[0].name(),
                    config.seed,
                    export_path.display()
                );
            }
            Ok(result) => {
                error!(
                    "✗ {} FAILED: {}",
                    scenarios[0].name(),
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
                std::process::exit(1);
            }
            Err(e) => {
                error!("Failed to write export: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = config.seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(config.clone()).with_seed(seed);

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED - {} ticks, index {}/{}",
                        scenario.name(),
                        seed,
                        result.total_ticks,
                        result.final_index,
                        result.route_len.saturating_sub(1)
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if !result.passed {
                failed_count += 1;
            }
            all_results.push(result);
        }
    }

    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "ticks": r.total_ticks,
                    "time_secs": r.final_time_secs,
                    "final_index": r.final_index,
                    "route_len": r.route_len,
                    "routes_loaded": r.metrics.routes_loaded,
                    "route_errors": r.metrics.route_errors,
                    "location_errors": r.metrics.location_errors,
                    "stale_completions": r.metrics.stale_completions,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(2);
            }
        }
    } else if failed_count == 0 {
        info!("✅ All {} scenario runs passed!", total);
    } else {
        error!("❌ {}/{} scenario runs failed!", failed_count, total);
    }

    if failed_count > 0 {
        std::process::exit(1);
    }
}
