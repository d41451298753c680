use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shoal_core::{AgentKind, FlockWorld, GridNeighborIndex, ShoalConfig, SphereField};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "shoal-sim",
    version,
    about = "Run a headless flocking simulation and log tick summaries"
)]
struct Cli {
    /// JSON configuration file; absent fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Override the configured boid population.
    #[arg(long)]
    boids: Option<usize>,

    /// Override the configured predator population.
    #[arg(long)]
    predators: Option<usize>,

    /// Override the world seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks between logged summaries.
    #[arg(long, default_value_t = 60)]
    log_interval: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut world = build_world(config)?;
    info!(
        seed = world.seed(),
        boids = world.config().initial_boids,
        predators = world.config().initial_predators,
        ticks = cli.ticks,
        "Starting shoal simulation"
    );

    let log_every = cli.log_interval.max(1);
    for _ in 0..cli.ticks {
        let events = world.step();
        if events.tick.0.is_multiple_of(log_every)
            && let Some(summary) = world.latest_summary()
        {
            info!(
                tick = summary.tick.0,
                boids = summary.boids,
                predators = summary.predators,
                mean_speed = summary.mean_speed,
                afraid = summary.afraid,
                alone = summary.alone,
                hunting = summary.hunting,
                attacking = summary.attacking,
                decisions = events.decisions,
                deflections = events.deflections,
                "tick summary"
            );
        }
    }

    match world.latest_summary() {
        Some(summary) => info!(
            tick = summary.tick.0,
            boids = summary.boids,
            predators = summary.predators,
            mean_speed = summary.mean_speed,
            "Run complete"
        ),
        None => warn!("Run complete without retained summaries"),
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Loads the JSON config (or defaults) and applies command-line overrides.
fn load_config(cli: &Cli) -> Result<ShoalConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        }
        None => ShoalConfig::default(),
    };
    if let Some(boids) = cli.boids {
        config.initial_boids = boids;
    }
    if let Some(predators) = cli.predators {
        config.initial_predators = predators;
    }
    if let Some(seed) = cli.seed {
        config.rng_seed = Some(seed);
    }
    Ok(config)
}

/// Wires the grid index and the configured sphere obstacles into a world,
/// then spawns the starting populations.
fn build_world(config: ShoalConfig) -> Result<FlockWorld> {
    let cell = config.boid.vision_radius.max(config.predator.vision_radius);
    let query = GridNeighborIndex::new(cell).context("invalid vision radius")?;
    let probe = SphereField::new(config.obstacles.clone());
    let mut world = FlockWorld::with_collaborators(config, Box::new(query), Box::new(probe))
        .context("invalid configuration")?;
    for _ in 0..world.config().initial_boids {
        world.spawn(AgentKind::Boid);
    }
    for _ in 0..world.config().initial_predators {
        world.spawn(AgentKind::Predator);
    }
    Ok(world)
}
