/*
 * Flocking Simulation Runner
 *
 * Headless driver: loads params, seeds the random source, drops a flock in
 * the middle of the world, runs it for a number of steps and prints the final
 * snapshot as JSON on stdout. Logs go to stderr.
 */

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::DVec2;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flocksim::{FlockWorld, SeededRandom, SimulationParams, DEFAULT_BOID_SIZE};

#[derive(Debug, Parser)]
#[command(name = "flocksim", about = "Run a headless flocking simulation")]
struct Args {
    /// TOML params file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Steps to simulate
    #[arg(short, long, default_value_t = 500)]
    steps: u64,

    /// Agents to spawn
    #[arg(short, long, default_value_t = 200)]
    agents: usize,

    /// Override the seed from the params file
    #[arg(long)]
    seed: Option<u64>,

    /// Radius of the spawn spot, as a fraction of the smaller world side
    #[arg(long, default_value_t = 0.25)]
    spot: f64,

    /// Include quadtree node boundaries in the output
    #[arg(long)]
    quadtree: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn setup_logging(args: &Args) {
    let level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_params(args: &Args) -> Result<SimulationParams> {
    let mut params = match &args.config {
        Some(path) => {
            let src = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            SimulationParams::from_toml_str(&src)
                .with_context(|| format!("invalid params in {}", path.display()))?
        }
        None => SimulationParams::default(),
    };
    if let Some(seed) = args.seed {
        params.seed = seed;
    }
    Ok(params)
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args);

    let params = load_params(&args)?;
    let centre = DVec2::new(params.width / 2.0, params.height / 2.0);
    let spot = params.width.min(params.height) * args.spot;
    let rng = SeededRandom::new(params.seed);
    info!(seed = rng.seed(), steps = args.steps, agents = args.agents, "starting run");

    let mut world = FlockWorld::new(params, rng)?;
    world.populate(args.agents, centre, spot, DEFAULT_BOID_SIZE)?;
    let stats = *world.run(args.steps);
    info!(
        step = stats.step,
        tree_nodes = stats.tree_nodes,
        tree_depth = stats.tree_depth,
        overlapping = stats.overlapping,
        "run finished"
    );

    let snapshot = world.snapshot(args.quadtree);
    serde_json::to_writer_pretty(std::io::stdout().lock(), &snapshot)
        .context("failed to write snapshot")?;
    println!();
    Ok(())
}
