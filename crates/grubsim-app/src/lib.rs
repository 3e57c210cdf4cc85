//! Shared plumbing for running grubsim worlds without a renderer.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use grubsim_core::{EcosystemConfig, FrameReport, PopulationSummary, TickEvents, World};
use tracing::info;

/// Read a JSON configuration file; missing fields fall back to defaults.
pub fn load_config(path: &Path) -> Result<EcosystemConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Totals accumulated over a headless run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub events: TickEvents,
    pub population: PopulationSummary,
}

/// Drives a world frame by frame, standing in for a render loop.
#[derive(Debug)]
pub struct HeadlessRunner {
    world: World,
    report_every: u64,
}

impl HeadlessRunner {
    /// Build and populate a world from `config`.
    pub fn new(config: EcosystemConfig, report_every: u64) -> Result<Self> {
        let world =
            World::populated(config).context("failed to initialize ecosystem world state")?;
        Ok(Self {
            world,
            report_every,
        })
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Run `frames` frames, logging a population report every `report_every` frames.
    pub fn run(&mut self, frames: u64) -> RunSummary {
        let mut summary = RunSummary {
            population: self.world.population(),
            ..RunSummary::default()
        };
        for frame in 1..=frames {
            let report = self.world.run_frame();
            summary.frames = frame;
            summary.events += report.events;
            summary.population = report.population;
            if self.report_every > 0 && frame.is_multiple_of(self.report_every) {
                log_report(frame, &report);
            }
        }
        summary
    }

    /// Write the current world snapshot as pretty JSON.
    pub fn write_snapshot(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.world.snapshot())
            .context("failed to serialize world snapshot")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))
    }
}

fn log_report(frame: u64, report: &FrameReport) {
    let population = &report.population;
    info!(
        frame,
        tick = population.tick.0,
        grubs = population.grubs,
        predators = population.predators,
        plants = population.plants,
        edible_parts = population.edible_parts,
        grubs_eaten = report.events.grubs_eaten,
        starved = report.events.predators_starved,
        "population report",
    );
}
