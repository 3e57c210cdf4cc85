use ordered_float::OrderedFloat;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::SpawnOrder;
use crate::config::GrubTraits;
use crate::geometry::{Bounds, Color, Position, Velocity};
use crate::plant::{EdiblePart, Plant};

/// Herbivore that seeks the nearest visible edible part and splits once fed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grub {
    position: Position,
    velocity: Velocity,
    energy: f32,
    traits: GrubTraits,
}

impl Grub {
    #[must_use]
    pub const fn new(position: Position, velocity: Velocity, traits: GrubTraits) -> Self {
        Self {
            position,
            velocity,
            energy: 0.0,
            traits,
        }
    }

    /// Grub at `position` with a random initial heading and speed.
    pub fn spawn(position: Position, traits: GrubTraits, rng: &mut dyn RngCore) -> Self {
        Self::new(position, random_velocity(traits.spawn_speed, rng), traits)
    }

    /// Restore a pooled grub to a newborn state at `position`.
    pub fn reinitialize(&mut self, position: Position, velocity: Velocity) {
        self.position = position;
        self.velocity = velocity;
        self.energy = 0.0;
    }

    pub fn set_traits(&mut self, traits: GrubTraits) {
        self.traits = traits;
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub const fn velocity(&self) -> Velocity {
        self.velocity
    }

    #[must_use]
    pub const fn energy(&self) -> f32 {
        self.energy
    }

    pub fn set_energy(&mut self, energy: f32) {
        self.energy = energy.max(0.0);
    }

    #[must_use]
    pub const fn size(&self) -> f32 {
        self.traits.size
    }

    #[must_use]
    pub const fn color(&self) -> Color {
        self.traits.color
    }

    #[must_use]
    pub const fn traits(&self) -> &GrubTraits {
        &self.traits
    }

    /// Nearest edible part strictly inside the vision radius.
    ///
    /// Ties resolve to the first part encountered, walking plants then parts in order.
    #[must_use]
    pub fn find_food<'a>(&self, plants: &'a [Plant]) -> Option<&'a EdiblePart> {
        let vision = self.traits.vision_radius;
        plants
            .iter()
            .flat_map(Plant::parts)
            .map(|part| (part, self.position.distance(part.position)))
            .filter(|(_, distance)| *distance < vision)
            .min_by_key(|(_, distance)| OrderedFloat(*distance))
            .map(|(part, _)| part)
    }

    /// Seek visible food at full speed, otherwise wander. Always wraps afterwards.
    pub fn move_step(&mut self, plants: &[Plant], bounds: Bounds, rng: &mut dyn RngCore) {
        match self.find_food(plants).map(|part| part.position) {
            Some(target) => self.seek(target),
            None => {
                self.wander(rng);
                self.position = self.position.offset(self.velocity);
            }
        }
        self.wrap_around(bounds);
    }

    /// Step straight toward `target` at `max_speed`, ignoring the current velocity.
    fn seek(&mut self, target: Position) {
        let angle = (target.y - self.position.y).atan2(target.x - self.position.x);
        let speed = self.traits.max_speed;
        self.position.x += angle.cos() * speed;
        self.position.y += angle.sin() * speed;
    }

    /// Random-walk velocity update: jitter each axis, then clamp to `max_speed`.
    fn wander(&mut self, rng: &mut dyn RngCore) {
        let jitter = self.traits.wander_jitter;
        if jitter > 0.0 {
            self.velocity.vx += rng.random_range(-jitter..jitter);
            self.velocity.vy += rng.random_range(-jitter..jitter);
        }
        self.velocity = self.velocity.clamp_speed(self.traits.max_speed);
    }

    pub fn wrap_around(&mut self, bounds: Bounds) {
        self.position = bounds.wrap(self.position);
    }

    /// Eat every part overlapping the grub, gaining one energy per part.
    pub fn eat(&mut self, plants: &mut [Plant]) -> usize {
        let position = self.position;
        let reach = self.traits.size;
        let eaten: usize = plants
            .iter_mut()
            .map(|plant| {
                plant.consume_parts(|part| position.distance(part.position) < reach + part.size)
            })
            .sum();
        self.energy += eaten as f32;
        eaten
    }

    /// Once energy reaches the threshold, spend all of it on one offspring placed
    /// within `offspring_jitter` of the parent on each axis.
    pub fn reproduce(&mut self, rng: &mut dyn RngCore) -> Option<SpawnOrder> {
        if self.energy < self.traits.energy_threshold {
            return None;
        }
        self.energy = 0.0;
        Some(SpawnOrder {
            position: jittered(self.position, self.traits.offspring_jitter, rng),
            velocity: random_velocity(self.traits.spawn_speed, rng),
        })
    }

    /// One tick of grub behavior: move, eat, reproduce.
    pub fn update(
        &mut self,
        plants: &mut [Plant],
        bounds: Bounds,
        rng: &mut dyn RngCore,
    ) -> GrubStep {
        self.move_step(plants, bounds, rng);
        let parts_eaten = self.eat(plants);
        let offspring = self.reproduce(rng);
        GrubStep {
            parts_eaten,
            offspring,
        }
    }
}

/// What a grub did during one update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrubStep {
    pub parts_eaten: usize,
    pub offspring: Option<SpawnOrder>,
}

pub(crate) fn random_velocity(bound: f32, rng: &mut dyn RngCore) -> Velocity {
    if bound > 0.0 {
        Velocity::new(
            rng.random_range(-bound..bound),
            rng.random_range(-bound..bound),
        )
    } else {
        Velocity::default()
    }
}

pub(crate) fn jittered(origin: Position, jitter: f32, rng: &mut dyn RngCore) -> Position {
    if jitter > 0.0 {
        Position::new(
            origin.x + rng.random_range(-jitter..jitter),
            origin.y + rng.random_range(-jitter..jitter),
        )
    } else {
        origin
    }
}
