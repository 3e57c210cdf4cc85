//! Renderer-facing views of the world.

use serde::{Deserialize, Serialize};

use crate::geometry::Color;
use crate::grub::Grub;
use crate::plant::Plant;
use crate::predator::Predator;
use crate::world::{PopulationSummary, World};

/// Colored axis-aligned square anchored at its top-left corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Quad {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: Color,
}

impl Quad {
    /// Two triangles covering the square, in the order a triangle-list draw expects.
    #[must_use]
    pub fn vertices(&self) -> [[f32; 2]; 6] {
        let (x, y, s) = (self.x, self.y, self.size);
        [
            [x, y],
            [x + s, y],
            [x, y + s],
            [x + s, y],
            [x, y + s],
            [x + s, y + s],
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartView {
    pub position: [f32; 2],
    pub size: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlantView {
    pub position: [f32; 2],
    pub color: Color,
    pub parts: Vec<PartView>,
}

impl From<&Plant> for PlantView {
    fn from(plant: &Plant) -> Self {
        Self {
            position: [plant.position().x, plant.position().y],
            color: plant.color(),
            parts: plant
                .parts()
                .iter()
                .map(|part| PartView {
                    position: [part.position.x, part.position.y],
                    size: part.size,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentView {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub size: f32,
    pub energy: f32,
    pub color: Color,
}

impl From<&Grub> for AgentView {
    fn from(grub: &Grub) -> Self {
        Self {
            position: [grub.position().x, grub.position().y],
            velocity: [grub.velocity().vx, grub.velocity().vy],
            size: grub.size(),
            energy: grub.energy(),
            color: grub.color(),
        }
    }
}

impl From<&Predator> for AgentView {
    fn from(predator: &Predator) -> Self {
        Self {
            position: [predator.position().x, predator.position().y],
            velocity: [predator.velocity().vx, predator.velocity().vy],
            size: predator.size(),
            energy: predator.energy(),
            color: predator.color(),
        }
    }
}

/// Everything a renderer or status display needs between two frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: f32,
    pub height: f32,
    pub speed_factor: u32,
    pub population: PopulationSummary,
    pub plants: Vec<PlantView>,
    pub grubs: Vec<AgentView>,
    pub predators: Vec<AgentView>,
}

impl World {
    /// Capture positions, sizes, and colors of every plant part and agent.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        let bounds = self.bounds();
        WorldSnapshot {
            tick: self.tick_count().0,
            width: bounds.width,
            height: bounds.height,
            speed_factor: self.speed_factor(),
            population: self.population(),
            plants: self.plants().iter().map(PlantView::from).collect(),
            grubs: self.grubs().iter().map(AgentView::from).collect(),
            predators: self.predators().iter().map(AgentView::from).collect(),
        }
    }

    /// Quads in draw order: plant parts, then grubs, then predators.
    #[must_use]
    pub fn quads(&self) -> Vec<Quad> {
        let parts = self.plants().iter().flat_map(|plant| {
            let color = plant.color();
            plant.parts().iter().map(move |part| Quad {
                x: part.position.x,
                y: part.position.y,
                size: part.size,
                color,
            })
        });
        let grubs = self.grubs().iter().map(|grub| Quad {
            x: grub.position().x,
            y: grub.position().y,
            size: grub.size(),
            color: grub.color(),
        });
        let predators = self.predators().iter().map(|predator| Quad {
            x: predator.position().x,
            y: predator.position().y,
            size: predator.size(),
            color: predator.color(),
        });
        parts.chain(grubs).chain(predators).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EcosystemConfig;

    #[test]
    fn quad_vertices_cover_square() {
        let quad = Quad {
            x: 1.0,
            y: 2.0,
            size: 3.0,
            color: [1.0; 4],
        };
        assert_eq!(
            quad.vertices(),
            [
                [1.0, 2.0],
                [4.0, 2.0],
                [1.0, 5.0],
                [4.0, 2.0],
                [1.0, 5.0],
                [4.0, 5.0],
            ]
        );
    }

    #[test]
    fn snapshot_mirrors_world() {
        let config = EcosystemConfig {
            rng_seed: Some(99),
            initial_grubs: 3,
            initial_plants: 2,
            initial_predators: 1,
            ..EcosystemConfig::default()
        };
        let world = World::populated(config).expect("world");
        let snapshot = world.snapshot();
        assert_eq!(snapshot.grubs.len(), 3);
        assert_eq!(snapshot.plants.len(), 2);
        assert_eq!(snapshot.predators.len(), 1);
        assert_eq!(snapshot.population, world.population());

        let quads = world.quads();
        assert_eq!(
            quads.len(),
            snapshot.population.edible_parts + 3 + 1
        );
        assert_eq!(quads.last().map(|quad| quad.color), Some([1.0, 0.0, 0.0, 1.0]));

        let json = serde_json::to_value(&snapshot).expect("json");
        assert!(json.get("speedFactor").is_some());
    }
}
