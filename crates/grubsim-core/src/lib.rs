//! Core types and tick pipeline for the grub/plant/predator ecosystem.
//!
//! Grubs graze the edible parts sprouting from permanent plants, predators hunt
//! grubs, and every agent lives in a wraparound arena. The [`World`] owns all
//! three populations, advances them one tick at a time, and exposes renderable
//! state through [`WorldSnapshot`] and [`Quad`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod geometry;
pub mod grub;
pub mod plant;
pub mod pool;
pub mod predator;
pub mod snapshot;
pub mod world;

pub use config::{EcosystemConfig, FALLBACK_SEED, GrubTraits, PlantTraits, PredatorTraits};
pub use geometry::{Bounds, Color, Position, Tick, Velocity};
pub use grub::{Grub, GrubStep};
pub use plant::{EdiblePart, Plant};
pub use pool::ObjectPool;
pub use predator::{HuntOutcome, Predator};
pub use snapshot::{AgentView, PartView, PlantView, Quad, WorldSnapshot};
pub use world::{FrameReport, PopulationSummary, TickEvents, World};

/// Errors that can occur when constructing or reconfiguring a world.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Placement for an agent born this tick, materialized by the world after the
/// sweep that produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpawnOrder {
    pub position: Position,
    pub velocity: Velocity,
}
