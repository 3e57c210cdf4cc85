//! World ownership and the per-tick update pipeline.

use std::collections::VecDeque;
use std::fmt;
use std::ops::AddAssign;

use rand::{Rng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::EcosystemConfig;
use crate::geometry::{Bounds, Position, Tick, Velocity};
use crate::grub::{Grub, random_velocity};
use crate::plant::Plant;
use crate::pool::ObjectPool;
use crate::predator::Predator;
use crate::{SpawnOrder, WorldError};

/// Counters describing what happened during one or more ticks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickEvents {
    /// Tick that produced these events (the last one when aggregated).
    pub tick: Tick,
    pub grub_births: usize,
    pub predator_births: usize,
    /// Grubs caught by predators.
    pub grubs_eaten: usize,
    pub predators_starved: usize,
    /// Edible parts eaten by grubs.
    pub parts_eaten: usize,
    /// Edible parts sprouted by plant regeneration.
    pub parts_regrown: usize,
}

impl AddAssign for TickEvents {
    fn add_assign(&mut self, rhs: Self) {
        self.tick = self.tick.max(rhs.tick);
        self.grub_births += rhs.grub_births;
        self.predator_births += rhs.predator_births;
        self.grubs_eaten += rhs.grubs_eaten;
        self.predators_starved += rhs.predators_starved;
        self.parts_eaten += rhs.parts_eaten;
        self.parts_regrown += rhs.parts_regrown;
    }
}

/// Population counts for display.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PopulationSummary {
    pub tick: Tick,
    pub grubs: usize,
    pub predators: usize,
    pub plants: usize,
    pub edible_parts: usize,
}

/// Outcome of one rendered frame's worth of ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub ticks_run: u32,
    pub events: TickEvents,
    pub population: PopulationSummary,
}

/// Aggregate simulation state: the three populations, the clock, and the speed factor.
pub struct World {
    config: EcosystemConfig,
    bounds: Bounds,
    tick: Tick,
    speed_factor: u32,
    rng: SmallRng,
    plants: Vec<Plant>,
    grubs: Vec<Grub>,
    predators: Vec<Predator>,
    grub_pool: ObjectPool<Grub>,
    predator_pool: ObjectPool<Predator>,
    history: VecDeque<PopulationSummary>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("bounds", &self.bounds)
            .field("tick", &self.tick)
            .field("speed_factor", &self.speed_factor)
            .field("plants", &self.plants.len())
            .field("grubs", &self.grubs.len())
            .field("predators", &self.predators.len())
            .finish()
    }
}

impl World {
    /// Instantiate an empty world using the supplied configuration.
    pub fn new(config: EcosystemConfig) -> Result<Self, WorldError> {
        config.validate()?;
        let rng = config.seeded_rng();
        let grub_traits = config.grub;
        let predator_traits = config.predator;
        let grub_pool = ObjectPool::new(
            config.pool_initial_size,
            config.pool_refill,
            move || Grub::new(Position::default(), Velocity::default(), grub_traits),
            move |grub: &mut Grub| {
                grub.reinitialize(Position::default(), Velocity::default());
                grub.set_traits(grub_traits);
            },
        );
        let predator_pool = ObjectPool::new(
            config.pool_initial_size,
            config.pool_refill,
            move || Predator::new(Position::default(), Velocity::default(), predator_traits),
            move |predator: &mut Predator| {
                predator.reinitialize(Position::default(), Velocity::default());
                predator.set_traits(predator_traits);
            },
        );
        Ok(Self {
            bounds: config.bounds(),
            speed_factor: config.speed_factor,
            history: VecDeque::with_capacity(config.history_capacity),
            config,
            tick: Tick::zero(),
            rng,
            plants: Vec::new(),
            grubs: Vec::new(),
            predators: Vec::new(),
            grub_pool,
            predator_pool,
        })
    }

    /// Build a world and seed it with the configured initial populations.
    pub fn populated(config: EcosystemConfig) -> Result<Self, WorldError> {
        let mut world = Self::new(config)?;
        world.populate();
        Ok(world)
    }

    /// Scatter the configured numbers of grubs, plants, and predators uniformly.
    pub fn populate(&mut self) {
        for _ in 0..self.config.initial_grubs {
            let position = self.random_position();
            self.spawn_grub(position);
        }
        for _ in 0..self.config.initial_plants {
            let position = self.random_position();
            let (min, max) = (self.config.plant_parts_min, self.config.plant_parts_max);
            let parts = if max > min {
                self.rng.random_range(min..max)
            } else {
                min
            };
            let plant = Plant::new(position, parts, self.config.plant, &mut self.rng);
            self.plants.push(plant);
        }
        for _ in 0..self.config.initial_predators {
            let position = self.random_position();
            self.spawn_predator(position);
        }
        debug!(
            grubs = self.grubs.len(),
            plants = self.plants.len(),
            predators = self.predators.len(),
            "populated world"
        );
    }

    fn random_position(&mut self) -> Position {
        Position::new(
            self.rng.random_range(0.0..self.bounds.width),
            self.rng.random_range(0.0..self.bounds.height),
        )
    }

    /// Add a plant with `parts` random edible parts.
    pub fn spawn_plant(&mut self, position: Position, parts: usize) -> &mut Plant {
        let plant = Plant::new(position, parts, self.config.plant, &mut self.rng);
        self.insert_plant(plant)
    }

    pub fn insert_plant(&mut self, plant: Plant) -> &mut Plant {
        self.plants.push(plant);
        let last = self.plants.len() - 1;
        &mut self.plants[last]
    }

    /// Add a pooled grub at `position` with a random velocity.
    pub fn spawn_grub(&mut self, position: Position) -> &mut Grub {
        let velocity = random_velocity(self.config.grub.spawn_speed, &mut self.rng);
        self.commit_grub(SpawnOrder { position, velocity })
    }

    pub fn insert_grub(&mut self, grub: Grub) -> &mut Grub {
        self.grubs.push(grub);
        let last = self.grubs.len() - 1;
        &mut self.grubs[last]
    }

    /// Add a pooled predator at `position` with a random velocity.
    pub fn spawn_predator(&mut self, position: Position) -> &mut Predator {
        let velocity = random_velocity(self.config.predator.spawn_speed, &mut self.rng);
        self.commit_predator(SpawnOrder { position, velocity })
    }

    pub fn insert_predator(&mut self, predator: Predator) -> &mut Predator {
        self.predators.push(predator);
        let last = self.predators.len() - 1;
        &mut self.predators[last]
    }

    fn commit_grub(&mut self, order: SpawnOrder) -> &mut Grub {
        let mut grub = self.grub_pool.acquire();
        grub.reinitialize(order.position, order.velocity);
        self.insert_grub(grub)
    }

    fn commit_predator(&mut self, order: SpawnOrder) -> &mut Predator {
        let mut predator = self.predator_pool.acquire();
        predator.reinitialize(order.position, order.velocity);
        self.insert_predator(predator)
    }

    /// Advance the simulation by exactly one tick.
    ///
    /// Grubs move, eat, and reproduce in collection order. Predators then run
    /// hunt, separate, move, and energy upkeep in reverse order, and starved
    /// predators are evicted on the spot. Offspring are committed only after the
    /// sweep of their own species, so no sweep ever visits an agent born during
    /// it; newborn grubs are already huntable by predators in the same tick.
    /// Plants grow and regenerate last.
    pub fn tick(&mut self) -> TickEvents {
        self.tick = self.tick.next();
        let mut events = TickEvents {
            tick: self.tick,
            ..TickEvents::default()
        };

        self.stage_grubs(&mut events);
        self.stage_predators(&mut events);
        self.stage_plants(&mut events);
        self.record_history();

        trace!(
            tick = self.tick.0,
            grubs = self.grubs.len(),
            predators = self.predators.len(),
            parts_eaten = events.parts_eaten,
            grubs_eaten = events.grubs_eaten,
            "tick complete"
        );
        events
    }

    fn stage_grubs(&mut self, events: &mut TickEvents) {
        let mut spawns = Vec::new();
        for grub in &mut self.grubs {
            let step = grub.update(&mut self.plants, self.bounds, &mut self.rng);
            events.parts_eaten += step.parts_eaten;
            spawns.extend(step.offspring);
        }

        events.grub_births = spawns.len();
        if !spawns.is_empty() {
            debug!(tick = self.tick.0, births = spawns.len(), "grubs reproduced");
        }
        for order in spawns {
            self.commit_grub(order);
        }
    }

    fn stage_predators(&mut self, events: &mut TickEvents) {
        let mut spawns = Vec::new();
        for idx in (0..self.predators.len()).rev() {
            let outcome = self.predators[idx].hunt(&mut self.grubs, self.bounds, &mut self.rng);
            if let Some(grub) = outcome.eaten {
                events.grubs_eaten += 1;
                self.grub_pool.release(grub);
            }
            spawns.extend(outcome.offspring);

            let (before, rest) = self.predators.split_at_mut(idx);
            if let Some((current, after)) = rest.split_first_mut() {
                current.separate(before.iter().chain(after.iter()).map(Predator::position));
                current.move_step();
                current.update_energy();
            }

            if self.predators[idx].is_dead() {
                let corpse = self.predators.remove(idx);
                events.predators_starved += 1;
                debug!(
                    tick = self.tick.0,
                    energy = corpse.energy(),
                    "predator starved"
                );
                self.predator_pool.release(corpse);
            }
        }

        events.predator_births = spawns.len();
        if !spawns.is_empty() {
            debug!(
                tick = self.tick.0,
                births = spawns.len(),
                "predators reproduced"
            );
        }
        for order in spawns {
            self.commit_predator(order);
        }
    }

    fn stage_plants(&mut self, events: &mut TickEvents) {
        for plant in &mut self.plants {
            if plant.update(self.tick, &mut self.rng) {
                events.parts_regrown += 1;
            }
        }
    }

    fn record_history(&mut self) {
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        let summary = self.population();
        self.history.push_back(summary);
    }

    /// Run one frame: `speed_factor` ticks back to back. A factor of zero pauses.
    pub fn run_frame(&mut self) -> FrameReport {
        let mut events = TickEvents {
            tick: self.tick,
            ..TickEvents::default()
        };
        for _ in 0..self.speed_factor {
            events += self.tick();
        }
        FrameReport {
            ticks_run: self.speed_factor,
            events,
            population: self.population(),
        }
    }

    /// Set how many ticks the next frames run before each render.
    pub fn set_speed_factor(&mut self, speed_factor: u32) {
        if speed_factor != self.speed_factor {
            debug!(from = self.speed_factor, to = speed_factor, "speed factor changed");
        }
        self.speed_factor = speed_factor;
    }

    #[must_use]
    pub const fn speed_factor(&self) -> u32 {
        self.speed_factor
    }

    /// Replace the arena bounds, e.g. after the host viewport was resized.
    pub fn set_bounds(&mut self, bounds: Bounds) -> Result<(), WorldError> {
        if !(bounds.width > 0.0 && bounds.height > 0.0)
            || !bounds.width.is_finite()
            || !bounds.height.is_finite()
        {
            return Err(WorldError::InvalidConfig(
                "arena bounds must be positive and finite",
            ));
        }
        self.bounds = bounds;
        Ok(())
    }

    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick_count(&self) -> Tick {
        self.tick
    }

    #[must_use]
    pub fn config(&self) -> &EcosystemConfig {
        &self.config
    }

    #[must_use]
    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    #[must_use]
    pub fn grubs(&self) -> &[Grub] {
        &self.grubs
    }

    #[must_use]
    pub fn predators(&self) -> &[Predator] {
        &self.predators
    }

    /// Free objects waiting in the grub and predator pools.
    #[must_use]
    pub fn pooled(&self) -> (usize, usize) {
        (self.grub_pool.len(), self.predator_pool.len())
    }

    /// Current population counts.
    #[must_use]
    pub fn population(&self) -> PopulationSummary {
        PopulationSummary {
            tick: self.tick,
            grubs: self.grubs.len(),
            predators: self.predators.len(),
            plants: self.plants.len(),
            edible_parts: self.plants.iter().map(|plant| plant.parts().len()).sum(),
        }
    }

    /// Iterate over retained per-tick population summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &PopulationSummary> {
        self.history.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GrubTraits, PredatorTraits};
    use crate::plant::EdiblePart;

    fn quiet_config() -> EcosystemConfig {
        EcosystemConfig {
            rng_seed: Some(7),
            initial_grubs: 0,
            initial_plants: 0,
            initial_predators: 0,
            history_capacity: 4,
            ..EcosystemConfig::default()
        }
    }

    #[test]
    fn populate_seeds_configured_counts() {
        let config = EcosystemConfig {
            rng_seed: Some(42),
            ..EcosystemConfig::default()
        };
        let world = World::populated(config).expect("world");
        let population = world.population();
        assert_eq!(population.grubs, 50);
        assert_eq!(population.plants, 100);
        assert_eq!(population.predators, 5);
        assert!(world.plants().iter().all(|plant| (5..15).contains(&plant.parts().len())));
        assert!(world.grubs().iter().all(|grub| world.bounds().contains(grub.position())));
    }

    #[test]
    fn tick_advances_clock_and_history() {
        let mut world = World::new(quiet_config()).expect("world");
        for _ in 0..6 {
            world.tick();
        }
        assert_eq!(world.tick_count(), Tick(6));
        let ticks: Vec<_> = world.history().map(|summary| summary.tick).collect();
        assert_eq!(ticks, vec![Tick(3), Tick(4), Tick(5), Tick(6)]);
    }

    #[test]
    fn newborn_predators_wait_for_next_tick() {
        let mut world = World::new(quiet_config()).expect("world");
        world.insert_grub(Grub::new(
            Position::new(100.0, 100.0),
            Velocity::default(),
            GrubTraits {
                wander_jitter: 0.0,
                ..GrubTraits::default()
            },
        ));
        let predator = world.insert_predator(Predator::new(
            Position::new(102.0, 100.0),
            Velocity::default(),
            PredatorTraits::default(),
        ));
        predator.set_energy(14.0);

        let events = world.tick();
        assert_eq!(events.grubs_eaten, 1);
        assert_eq!(events.predator_births, 1);
        assert_eq!(world.predators().len(), 2);

        let parent = &world.predators()[0];
        let child = &world.predators()[1];
        // Parent paid upkeep; the child has not been processed yet.
        assert!((parent.energy() - 8.0).abs() < 1e-5);
        assert_eq!(child.energy(), 0.0);
    }

    #[test]
    fn starved_predators_return_to_pool() {
        let mut world = World::new(quiet_config()).expect("world");
        let (_, pooled_before) = world.pooled();
        let predator = world.spawn_predator(Position::new(10.0, 10.0));
        predator.set_energy(-499.0);
        assert_eq!(world.pooled().1, pooled_before - 1);

        let events = world.tick();
        assert_eq!(events.predators_starved, 1);
        assert!(world.predators().is_empty());
        assert_eq!(world.pooled().1, pooled_before);
    }

    #[test]
    fn grub_offspring_join_after_sweep() {
        let mut world = World::new(quiet_config()).expect("world");
        let mut plant = Plant::bare(Position::new(300.0, 300.0), world.config().plant);
        plant.push_part(EdiblePart {
            position: Position::new(301.0, 300.0),
            size: 2.0,
        });
        world.insert_plant(plant);
        world.insert_grub(Grub::new(
            Position::new(300.0, 300.0),
            Velocity::default(),
            GrubTraits::default(),
        ));

        let events = world.tick();
        assert_eq!(events.parts_eaten, 1);
        assert_eq!(events.grub_births, 1);
        assert_eq!(world.grubs().len(), 2);
        assert_eq!(world.grubs()[0].energy(), 0.0);
        assert_eq!(world.population().edible_parts, 0);
    }

    #[test]
    fn grub_offspring_are_huntable_the_tick_they_are_born() {
        let mut world = World::new(quiet_config()).expect("world");
        let mut plant = Plant::bare(Position::new(300.0, 300.0), world.config().plant);
        plant.push_part(EdiblePart {
            position: Position::new(301.0, 300.0),
            size: 2.0,
        });
        world.insert_plant(plant);
        // Seeks to (303, 300), eats, and drops a motionless offspring on the same spot.
        world.insert_grub(Grub::new(
            Position::new(300.0, 300.0),
            Velocity::default(),
            GrubTraits {
                offspring_jitter: 0.0,
                spawn_speed: 0.0,
                ..GrubTraits::default()
            },
        ));
        world.insert_predator(Predator::new(
            Position::new(306.0, 300.0),
            Velocity::default(),
            PredatorTraits::default(),
        ));
        world.insert_predator(Predator::new(
            Position::new(303.0, 304.0),
            Velocity::default(),
            PredatorTraits::default(),
        ));

        let events = world.tick();
        assert_eq!(events.grub_births, 1);
        assert_eq!(events.grubs_eaten, 2);
        assert_eq!(events.predator_births, 0);
        assert!(world.grubs().is_empty());
    }

    #[test]
    fn pooled_grubs_come_back_with_configured_traits() {
        let config = EcosystemConfig {
            pool_initial_size: 0,
            ..quiet_config()
        };
        let mut world = World::new(config).expect("world");
        world.insert_grub(Grub::new(
            Position::new(100.0, 100.0),
            Velocity::default(),
            GrubTraits {
                size: 1.0,
                vision_radius: 0.0,
                max_speed: 0.5,
                wander_jitter: 0.0,
                ..GrubTraits::default()
            },
        ));
        world.insert_predator(Predator::new(
            Position::new(102.0, 100.0),
            Velocity::default(),
            PredatorTraits::default(),
        ));

        let events = world.tick();
        assert_eq!(events.grubs_eaten, 1);
        assert_eq!(world.pooled().0, 1);

        let expected = world.config().grub;
        let grub = world.spawn_grub(Position::new(50.0, 50.0));
        assert_eq!(*grub.traits(), expected);
        assert_eq!(world.pooled().0, 0);
    }

    #[test]
    fn pooled_predators_come_back_with_configured_traits() {
        let config = EcosystemConfig {
            pool_initial_size: 0,
            ..quiet_config()
        };
        let mut world = World::new(config).expect("world");
        world.insert_predator(Predator::new(
            Position::new(100.0, 100.0),
            Velocity::default(),
            PredatorTraits {
                energy_loss_per_tick: 1000.0,
                max_speed: 0.5,
                ..PredatorTraits::default()
            },
        ));

        let events = world.tick();
        assert_eq!(events.predators_starved, 1);
        assert_eq!(world.pooled().1, 1);

        let expected = world.config().predator;
        let predator = world.spawn_predator(Position::new(50.0, 50.0));
        assert_eq!(*predator.traits(), expected);
        assert!(!predator.is_dead());
    }

    #[test]
    fn run_frame_honours_speed_factor() {
        let mut world = World::new(quiet_config()).expect("world");
        world.set_speed_factor(5);
        let report = world.run_frame();
        assert_eq!(report.ticks_run, 5);
        assert_eq!(report.events.tick, Tick(5));
        assert_eq!(world.tick_count(), Tick(5));

        world.set_speed_factor(0);
        let paused = world.run_frame();
        assert_eq!(paused.ticks_run, 0);
        assert_eq!(world.tick_count(), Tick(5));
    }

    #[test]
    fn set_bounds_rejects_empty_arena() {
        let mut world = World::new(quiet_config()).expect("world");
        assert!(world.set_bounds(Bounds::new(0.0, 10.0)).is_err());
        world
            .set_bounds(Bounds::new(1024.0, 768.0))
            .expect("resize");
        assert_eq!(world.bounds(), Bounds::new(1024.0, 768.0));
    }
}
