use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::config::PlantTraits;
use crate::geometry::{Color, Position, Tick};

/// A small consumable unit owned by a plant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EdiblePart {
    pub position: Position,
    pub size: f32,
}

/// Permanent food source that sprouts edible parts around its center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    position: Position,
    traits: PlantTraits,
    parts: Vec<EdiblePart>,
    last_regeneration: Tick,
}

impl Plant {
    /// Plant at `position` with `part_count` randomly placed parts.
    pub fn new(
        position: Position,
        part_count: usize,
        traits: PlantTraits,
        rng: &mut dyn RngCore,
    ) -> Self {
        let mut plant = Self::bare(position, traits);
        plant.parts.reserve(part_count);
        for _ in 0..part_count {
            plant.add_part(rng);
        }
        plant
    }

    /// Plant with no edible parts.
    #[must_use]
    pub fn bare(position: Position, traits: PlantTraits) -> Self {
        Self {
            position,
            traits,
            parts: Vec::new(),
            last_regeneration: Tick::zero(),
        }
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
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
    pub const fn traits(&self) -> &PlantTraits {
        &self.traits
    }

    #[must_use]
    pub fn parts(&self) -> &[EdiblePart] {
        &self.parts
    }

    #[must_use]
    pub const fn last_regeneration(&self) -> Tick {
        self.last_regeneration
    }

    /// Sprout a part within `±size` of the center on each axis.
    pub fn add_part(&mut self, rng: &mut dyn RngCore) {
        let reach = self.traits.size;
        let dx = if reach > 0.0 {
            rng.random_range(-reach..reach)
        } else {
            0.0
        };
        let dy = if reach > 0.0 {
            rng.random_range(-reach..reach)
        } else {
            0.0
        };
        let (min, max) = (self.traits.part_size_min, self.traits.part_size_max);
        let size = if max > min {
            rng.random_range(min..max)
        } else {
            min
        };
        self.push_part(EdiblePart {
            position: Position::new(self.position.x + dx, self.position.y + dy),
            size,
        });
    }

    /// Append an already constructed part.
    pub fn push_part(&mut self, part: EdiblePart) {
        self.parts.push(part);
    }

    /// Drop the part at `index`, preserving the order of the rest.
    pub fn remove_part(&mut self, index: usize) -> Option<EdiblePart> {
        (index < self.parts.len()).then(|| self.parts.remove(index))
    }

    /// Remove every part for which `eaten` returns true, returning how many went.
    pub fn consume_parts(&mut self, mut eaten: impl FnMut(&EdiblePart) -> bool) -> usize {
        let before = self.parts.len();
        self.parts.retain(|part| !eaten(part));
        before - self.parts.len()
    }

    /// Enlarge every part by the per-tick growth increment.
    pub fn grow(&mut self) {
        let growth = self.traits.part_growth;
        for part in &mut self.parts {
            part.size += growth;
        }
    }

    /// Grow, then sprout one part when more than `regenerate_rate` ticks passed
    /// since the last regeneration. Returns whether a part was added.
    pub fn update(&mut self, now: Tick, rng: &mut dyn RngCore) -> bool {
        self.grow();
        if now.since(self.last_regeneration) > self.traits.regenerate_rate {
            self.add_part(rng);
            self.last_regeneration = now;
            true
        } else {
            false
        }
    }
}
