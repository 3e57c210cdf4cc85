use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use grubsim_app::{HeadlessRunner, load_config};
use grubsim_core::EcosystemConfig;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "grubsim",
    version,
    about = "Run the grub/plant/predator ecosystem headlessly"
)]
struct Cli {
    /// JSON configuration file; omitted fields use built-in defaults.
    #[arg(short, long, env = "GRUBSIM_CONFIG")]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible run.
    #[arg(long, env = "GRUBSIM_SEED")]
    seed: Option<u64>,

    /// Arena width in world units.
    #[arg(long)]
    width: Option<f32>,

    /// Arena height in world units.
    #[arg(long)]
    height: Option<f32>,

    /// Number of frames to run.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Ticks simulated per frame.
    #[arg(long)]
    speed: Option<u32>,

    /// Log a population report every N frames (0 disables).
    #[arg(long, default_value_t = 60)]
    report_every: u64,

    /// Write the final world snapshot as JSON to this path.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Result<EcosystemConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => EcosystemConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
        }
        if let Some(width) = self.width {
            config.world_width = width;
        }
        if let Some(height) = self.height {
            config.world_height = height;
        }
        if let Some(speed) = self.speed {
            config.speed_factor = speed;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    info!(
        width = config.world_width,
        height = config.world_height,
        speed = config.speed_factor,
        frames = cli.frames,
        "Starting grubsim headless run"
    );
    let mut runner = HeadlessRunner::new(config, cli.report_every)?;
    let summary = runner.run(cli.frames);

    if summary.population.grubs == 0 && summary.population.predators == 0 {
        warn!(tick = summary.population.tick.0, "all animals died out");
    }
    info!(
        frames = summary.frames,
        tick = summary.population.tick.0,
        grubs = summary.population.grubs,
        predators = summary.population.predators,
        grub_births = summary.events.grub_births,
        predator_births = summary.events.predator_births,
        grubs_eaten = summary.events.grubs_eaten,
        starved = summary.events.predators_starved,
        "Run complete",
    );

    if let Some(path) = &cli.snapshot {
        runner.write_snapshot(path)?;
        info!(path = %path.display(), "Wrote world snapshot");
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
