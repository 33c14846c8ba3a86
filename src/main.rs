use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::Path;

use signal_sim::{
    config::{LevelsConfig, SimulationConfig},
    scenario::{Scenario, ScenarioRunner},
    simulation::{Difficulty, PerformanceTracker},
};

#[derive(Parser)]
#[command(name = "signal-sim")]
#[command(about = "Headless runner for the signal-controlled traffic game")]
struct Args {
    /// Which game to run
    #[arg(long, value_enum, default_value_t = ScenarioKind::Intersection)]
    scenario: ScenarioKind,

    /// Spawn pace of the intersection game: easy, medium or hard
    #[arg(short, long, default_value = "easy")]
    difficulty: Difficulty,

    /// Intersection configuration file
    #[arg(short, long, default_value = "intersection.toml")]
    intersection: String,

    /// Traffic configuration file
    #[arg(short, long, default_value = "traffic.toml")]
    traffic: String,

    /// Level definitions for the grid game
    #[arg(long, default_value = "levels.toml")]
    levels: String,

    /// Grid level to start on
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// Random seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Simulated seconds to run for
    #[arg(long, default_value_t = 120.0)]
    duration: f32,

    /// Cycle the lights automatically every N simulated seconds
    #[arg(long)]
    auto_cycle: Option<f32>,

    /// Enable verbose logging for detailed simulation progress
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ScenarioKind {
    /// Single four-way crossing with toggled lights
    Intersection,
    /// Tile grid with A* routed vehicles
    Grid,
}

const FRAME_MS: f32 = 1000.0 / 60.0;
const STATUS_INTERVAL_MS: f32 = 5000.0;
const DEFAULT_TIMING_SAMPLES: usize = 60;

fn load_simulation_config(args: &Args) -> Result<SimulationConfig> {
    if Path::new(&args.intersection).exists() && Path::new(&args.traffic).exists() {
        info!("Loading configuration from {} and {}", args.intersection, args.traffic);
        return SimulationConfig::load_from_files(&args.intersection, &args.traffic);
    }

    warn!("Configuration files not found, using built-in defaults");
    Ok(SimulationConfig::default())
}

fn load_levels(args: &Args) -> Result<LevelsConfig> {
    if Path::new(&args.levels).exists() {
        info!("Loading levels from {}", args.levels);
        return LevelsConfig::load_from_file(&args.levels);
    }

    warn!("Level file {} not found, using built-in levels", args.levels);
    Ok(LevelsConfig::default())
}

/// Builds the chosen scenario along with the number of frame timings to
/// average over.
fn build_runner(args: &Args) -> Result<(ScenarioRunner, usize)> {
    match args.scenario {
        ScenarioKind::Intersection => {
            let config = load_simulation_config(args)?;
            info!(
                "Intersection: {}x{} canvas, {}px roads, turn paths {}",
                config.intersection.geometry.width,
                config.intersection.geometry.height,
                config.intersection.geometry.road_width,
                if config.intersection.geometry.turn_paths { "on" } else { "off" }
            );
            info!("Difficulty: {} ({}ms between spawns)", args.difficulty, args.difficulty.spawn_rate_ms());
            let samples = config.traffic.performance.timing_samples as usize;
            Ok((ScenarioRunner::new_crossing(&config, args.difficulty, args.seed), samples))
        }
        ScenarioKind::Grid => {
            let levels = load_levels(args)?;
            info!("Levels loaded: {}", levels.levels.len());
            let runner = ScenarioRunner::new_grid(levels, args.level, args.seed)?;
            Ok((runner, DEFAULT_TIMING_SAMPLES))
        }
    }
}

fn log_summary(runner: &ScenarioRunner) {
    match runner {
        ScenarioRunner::Crossing(crossing) => {
            let session = &crossing.session;
            info!("Score: {}", session.score);
            info!("Cars managed: {}", session.completed);
            info!("Accidents: {}", session.accidents);
            info!("Longest wait: {:.1}s", session.longest_wait / 1000.0);
            info!("Flow rate: {:.1} cars/min", session.flow_rate());
            if let Some(reason) = session.over_reason {
                info!("Game over: {}", reason);
            }
        }
        ScenarioRunner::Grid(grid) => {
            let levels = &grid.levels;
            if let Some(level) = levels.current() {
                info!("Level {}: {}", level.number, level.name);
            }
            info!("Score: {}", levels.score);
            info!("Vehicles managed: {}", levels.vehicles_managed);
            info!("Flow rate: {:.1} vehicles/min", levels.flow_rate);
            info!("Congestion: {:.0}%", levels.congestion);
            info!("Outcome: {:?}", grid.outcome);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting signal-sim (headless)");

    let (mut runner, timing_samples) = build_runner(&args)?;
    info!("Scenario: {}", runner.name());
    if let Some(seed) = args.seed {
        info!("Random Seed: {}", seed);
    }

    let mut performance_tracker = PerformanceTracker::new(timing_samples);
    let duration_ms = args.duration.max(0.0) * 1000.0;
    let cycle_ms = args.auto_cycle.map(|s| s * 1000.0).filter(|ms| *ms > 0.0);

    let mut elapsed = 0.0;
    let mut since_status = 0.0;
    let mut since_cycle = 0.0;
    let mut frame_count: u64 = 0;

    while elapsed < duration_ms && !runner.is_over() {
        performance_tracker.start_frame();
        performance_tracker.start_simulation();

        let steps = runner.frame(FRAME_MS)?;
        if let ScenarioRunner::Crossing(crossing) = &mut runner {
            for (cue, volume) in crossing.session.drain_sounds() {
                debug!("Sound {} at volume {:.1}", cue.name(), volume);
            }
        }

        performance_tracker.end_simulation(steps);
        performance_tracker.end_frame();

        frame_count += 1;
        elapsed += FRAME_MS;
        since_status += FRAME_MS;

        if let Some(cycle_ms) = cycle_ms {
            since_cycle += FRAME_MS;
            if since_cycle >= cycle_ms {
                since_cycle = 0.0;
                runner.cycle_lights();
            }
        }

        if since_status >= STATUS_INTERVAL_MS {
            since_status = 0.0;
            info!(
                "t={:.0}s: {} vehicles active, {} completed, sim {:.3}ms/frame",
                elapsed / 1000.0,
                runner.active_vehicles(),
                runner.completed(),
                performance_tracker.average_simulation_time().as_secs_f64() * 1000.0
            );
        }
    }

    info!("Simulation completed!");
    info!("Simulated time: {:.1}s over {} frames", elapsed / 1000.0, frame_count);
    info!(
        "Average frame: {:.3}ms ({:.0} frames/s wall clock)",
        performance_tracker.average_frame_time().as_secs_f64() * 1000.0,
        performance_tracker.fps()
    );
    log_summary(&runner);

    Ok(())
}
