use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Color};
use crate::WorldError;

/// Seed used when no explicit seed is configured and OS entropy is unavailable.
pub const FALLBACK_SEED: u64 = 0x6E55_B0B5_0000_1234;

/// Static configuration for an ecosystem world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EcosystemConfig {
    /// Width of the arena in world units.
    pub world_width: f32,
    /// Height of the arena in world units.
    pub world_height: f32,
    /// Optional RNG seed for reproducible worlds.
    pub rng_seed: Option<u64>,
    /// Ticks simulated per rendered frame.
    pub speed_factor: u32,
    /// Maximum number of recent population summaries retained in-memory.
    pub history_capacity: usize,
    /// Grubs seeded by `World::populate`.
    pub initial_grubs: usize,
    /// Plants seeded by `World::populate`.
    pub initial_plants: usize,
    /// Predators seeded by `World::populate`.
    pub initial_predators: usize,
    /// Lower bound (inclusive) on edible parts a seeded plant starts with.
    pub plant_parts_min: usize,
    /// Upper bound (exclusive) on edible parts a seeded plant starts with.
    pub plant_parts_max: usize,
    /// Objects pre-built in each agent pool.
    pub pool_initial_size: usize,
    /// Objects built when an agent pool runs dry.
    pub pool_refill: usize,
    pub plant: PlantTraits,
    pub grub: GrubTraits,
    pub predator: PredatorTraits,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            world_width: 800.0,
            world_height: 600.0,
            rng_seed: None,
            speed_factor: 1,
            history_capacity: 256,
            initial_grubs: 50,
            initial_plants: 100,
            initial_predators: 5,
            plant_parts_min: 5,
            plant_parts_max: 15,
            pool_initial_size: 10,
            pool_refill: 5,
            plant: PlantTraits::default(),
            grub: GrubTraits::default(),
            predator: PredatorTraits::default(),
        }
    }
}

/// Parameters shared by every plant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlantTraits {
    /// Half-extent of the square around the plant center where parts sprout.
    pub size: f32,
    pub color: Color,
    /// Ticks between regenerated parts.
    pub regenerate_rate: u64,
    /// Size added to every edible part each tick.
    pub part_growth: f32,
    pub part_size_min: f32,
    pub part_size_max: f32,
}

impl Default for PlantTraits {
    fn default() -> Self {
        Self {
            size: 10.0,
            color: [0.0, 0.5, 0.0, 1.0],
            regenerate_rate: 100,
            part_growth: 0.05,
            part_size_min: 2.0,
            part_size_max: 5.0,
        }
    }
}

/// Parameters shared by every grub.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrubTraits {
    pub size: f32,
    pub color: Color,
    /// Energy at which a grub splits off an offspring.
    pub energy_threshold: f32,
    /// Food farther than this is invisible.
    pub vision_radius: f32,
    pub max_speed: f32,
    /// Per-axis velocity jitter applied while wandering.
    pub wander_jitter: f32,
    /// Per-axis bound on the random velocity a fresh grub starts with.
    pub spawn_speed: f32,
    /// Per-axis bound on the offspring offset from its parent.
    pub offspring_jitter: f32,
}

impl Default for GrubTraits {
    fn default() -> Self {
        Self {
            size: 5.0,
            color: [0.0, 1.0, 0.0, 1.0],
            energy_threshold: 1.0,
            vision_radius: 50.0,
            max_speed: 3.0,
            wander_jitter: 1.0,
            spawn_speed: 5.0,
            offspring_jitter: 10.0,
        }
    }
}

/// Parameters shared by every predator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PredatorTraits {
    /// Catch radius and rendered size.
    pub size: f32,
    pub color: Color,
    /// Energy spent (and required) to produce one offspring.
    pub reproduction_threshold: f32,
    /// Radius inside which other predators push this one away.
    pub min_separation: f32,
    pub energy_loss_per_tick: f32,
    /// Energy at or below which the predator dies.
    pub starvation_threshold: f32,
    pub max_speed: f32,
    /// Fraction of the unit pursuit direction added to velocity per tick.
    pub pursuit_acceleration: f32,
    /// Energy gained by eating one grub.
    pub catch_energy: f32,
    pub spawn_speed: f32,
    pub offspring_jitter: f32,
}

impl Default for PredatorTraits {
    fn default() -> Self {
        Self {
            size: 8.0,
            color: [1.0, 0.0, 0.0, 1.0],
            reproduction_threshold: 15.0,
            min_separation: 20.0,
            energy_loss_per_tick: 1.0,
            starvation_threshold: -500.0,
            max_speed: 2.0,
            pursuit_acceleration: 0.1,
            catch_energy: 10.0,
            spawn_speed: 5.0,
            offspring_jitter: 10.0,
        }
    }
}

impl EcosystemConfig {
    /// Arena bounds derived from the configured world size.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.world_width, self.world_height)
    }

    /// Rejects configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !(self.world_width > 0.0 && self.world_height > 0.0)
            || !self.world_width.is_finite()
            || !self.world_height.is_finite()
        {
            return Err(WorldError::InvalidConfig(
                "world dimensions must be positive and finite",
            ));
        }
        if self.history_capacity == 0 {
            return Err(WorldError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        if self.plant_parts_min > self.plant_parts_max {
            return Err(WorldError::InvalidConfig(
                "plant_parts_min cannot exceed plant_parts_max",
            ));
        }
        if self.pool_refill == 0 {
            return Err(WorldError::InvalidConfig("pool_refill must be non-zero"));
        }

        let plant = &self.plant;
        if plant.size < 0.0
            || plant.part_growth < 0.0
            || plant.part_size_min < 0.0
            || plant.part_size_min > plant.part_size_max
        {
            return Err(WorldError::InvalidConfig(
                "plant size and growth must be non-negative with part_size_min <= part_size_max",
            ));
        }

        let grub = &self.grub;
        if grub.size <= 0.0
            || grub.max_speed <= 0.0
            || grub.vision_radius < 0.0
            || grub.energy_threshold <= 0.0
            || grub.wander_jitter < 0.0
            || grub.spawn_speed < 0.0
            || grub.offspring_jitter < 0.0
        {
            return Err(WorldError::InvalidConfig(
                "grub size, speed, and energy threshold must be positive, jitter non-negative",
            ));
        }

        let predator = &self.predator;
        if predator.size <= 0.0
            || predator.max_speed <= 0.0
            || predator.reproduction_threshold <= 0.0
            || predator.min_separation < 0.0
            || predator.energy_loss_per_tick < 0.0
            || predator.pursuit_acceleration < 0.0
            || predator.catch_energy < 0.0
            || predator.spawn_speed < 0.0
            || predator.offspring_jitter < 0.0
        {
            return Err(WorldError::InvalidConfig(
                "predator size, speed, and reproduction threshold must be positive, rates non-negative",
            ));
        }
        if predator.starvation_threshold > 0.0 {
            return Err(WorldError::InvalidConfig(
                "starvation_threshold must not be positive",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG, drawing a seed from entropy if none is set.
    pub(crate) fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => entropy_rng(),
        }
    }
}

#[cfg(feature = "entropy")]
fn entropy_rng() -> SmallRng {
    SmallRng::from_os_rng()
}

#[cfg(not(feature = "entropy"))]
fn entropy_rng() -> SmallRng {
    SmallRng::seed_from_u64(FALLBACK_SEED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EcosystemConfig::default()
            .validate()
            .expect("default config is valid");
    }

    #[test]
    fn rejects_degenerate_arena() {
        let config = EcosystemConfig {
            world_width: 0.0,
            ..EcosystemConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(WorldError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_positive_starvation_threshold() {
        let mut config = EcosystemConfig::default();
        config.predator.starvation_threshold = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EcosystemConfig =
            serde_json::from_str(r#"{ "world_width": 320.0, "grub": { "max_speed": 4.0 } }"#)
                .expect("parse");
        assert_eq!(config.world_width, 320.0);
        assert_eq!(config.world_height, 600.0);
        assert_eq!(config.grub.max_speed, 4.0);
        assert_eq!(config.grub.vision_radius, 50.0);
    }
}
