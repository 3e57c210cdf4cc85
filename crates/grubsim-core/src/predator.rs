use ordered_float::OrderedFloat;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::SpawnOrder;
use crate::config::PredatorTraits;
use crate::geometry::{Bounds, Color, Position, Velocity};
use crate::grub::{Grub, jittered, random_velocity};

/// Carnivore that pursues the nearest grub anywhere in the arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Predator {
    position: Position,
    velocity: Velocity,
    energy: f32,
    dead: bool,
    traits: PredatorTraits,
}

/// Result of one pursuit step.
#[derive(Debug, Default)]
pub struct HuntOutcome {
    /// The grub caught this step, already removed from the grub collection.
    pub eaten: Option<Grub>,
    /// Offspring produced because the catch pushed energy over the threshold.
    pub offspring: Option<SpawnOrder>,
}

impl Predator {
    #[must_use]
    pub const fn new(position: Position, velocity: Velocity, traits: PredatorTraits) -> Self {
        Self {
            position,
            velocity,
            energy: 0.0,
            dead: false,
            traits,
        }
    }

    /// Predator at `position` with a random initial velocity.
    pub fn spawn(position: Position, traits: PredatorTraits, rng: &mut dyn RngCore) -> Self {
        Self::new(position, random_velocity(traits.spawn_speed, rng), traits)
    }

    /// Restore a pooled predator to a newborn state.
    pub fn reinitialize(&mut self, position: Position, velocity: Velocity) {
        self.position = position;
        self.velocity = velocity;
        self.energy = 0.0;
        self.dead = false;
    }

    pub fn set_traits(&mut self, traits: PredatorTraits) {
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
        self.energy = energy;
    }

    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
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
    pub const fn traits(&self) -> &PredatorTraits {
        &self.traits
    }

    /// Burn the per-tick energy cost, dying at or below the starvation threshold.
    pub fn update_energy(&mut self) {
        if self.dead {
            return;
        }
        self.energy -= self.traits.energy_loss_per_tick;
        if self.energy <= self.traits.starvation_threshold {
            self.dead = true;
        }
    }

    /// Steer toward the nearest grub and eat it when within `size`.
    ///
    /// A catch clears any energy debt before crediting `catch_energy`. The caught
    /// grub is removed from `grubs` preserving the order of the rest.
    pub fn hunt(
        &mut self,
        grubs: &mut Vec<Grub>,
        bounds: Bounds,
        rng: &mut dyn RngCore,
    ) -> HuntOutcome {
        let mut outcome = HuntOutcome::default();
        if self.dead {
            return outcome;
        }

        let nearest = grubs
            .iter()
            .enumerate()
            .map(|(idx, grub)| (idx, self.position.distance_sq(grub.position())))
            .min_by_key(|(_, distance_sq)| OrderedFloat(*distance_sq));

        if let Some((idx, distance_sq)) = nearest {
            if let Some(direction) = Velocity::direction(self.position, grubs[idx].position()) {
                self.velocity = (self.velocity + direction * self.traits.pursuit_acceleration)
                    .clamp_speed(self.traits.max_speed);
            }

            let reach = self.traits.size;
            if distance_sq < reach * reach {
                self.energy = self.energy.max(0.0) + self.traits.catch_energy;
                outcome.eaten = Some(grubs.remove(idx));
            }
        }

        self.position = bounds.wrap(self.position);

        if self.energy >= self.traits.reproduction_threshold {
            outcome.offspring = Some(self.reproduce(rng));
        }
        outcome
    }

    /// Push away from every other predator closer than `min_separation`.
    ///
    /// Each neighbor contributes a unit vector pointing away from it; the average
    /// is added to velocity unclamped. Neighbors at distance zero are ignored.
    pub fn separate<I>(&mut self, neighbors: I)
    where
        I: IntoIterator<Item = Position>,
    {
        if self.dead {
            return;
        }
        let mut push = Velocity::default();
        let mut count = 0_u32;
        for other in neighbors {
            let distance = self.position.distance(other);
            if distance > 0.0 && distance < self.traits.min_separation {
                push.vx += (self.position.x - other.x) / distance;
                push.vy += (self.position.y - other.y) / distance;
                count += 1;
            }
        }
        if count > 0 {
            self.velocity = self.velocity + push * (1.0 / count as f32);
        }
    }

    /// Advance by the current velocity, then clamp speed to `max_speed`.
    pub fn move_step(&mut self) {
        if self.dead {
            return;
        }
        self.position = self.position.offset(self.velocity);
        self.velocity = self.velocity.clamp_speed(self.traits.max_speed);
    }

    /// Spend `reproduction_threshold` energy on one offspring; surplus carries over.
    pub fn reproduce(&mut self, rng: &mut dyn RngCore) -> SpawnOrder {
        self.energy -= self.traits.reproduction_threshold;
        SpawnOrder {
            position: jittered(self.position, self.traits.offspring_jitter, rng),
            velocity: random_velocity(self.traits.spawn_speed, rng),
        }
    }
}
