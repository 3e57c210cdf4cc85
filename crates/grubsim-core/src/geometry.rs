//! Planar vector helpers and the toroidal arena.

use serde::{Deserialize, Serialize};

/// RGBA color handed to the renderer untouched.
pub type Color = [f32; 4];

/// Axis-aligned 2D position in arena units.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Construct a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Squared distance to `other`.
    #[must_use]
    pub fn distance_sq(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Returns this position shifted by `velocity`.
    #[must_use]
    pub fn offset(self, velocity: Velocity) -> Self {
        Self::new(self.x + velocity.vx, self.y + velocity.vy)
    }
}

/// Per-tick displacement.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    /// Construct a new velocity vector.
    #[must_use]
    pub const fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    #[must_use]
    pub fn speed(self) -> f32 {
        self.vx.hypot(self.vy)
    }

    /// Rescale to `max` when the vector is longer than `max`.
    #[must_use]
    pub fn clamp_speed(self, max: f32) -> Self {
        let speed = self.speed();
        if speed > max {
            Self::new(self.vx / speed * max, self.vy / speed * max)
        } else {
            self
        }
    }

    /// Unit vector pointing from `from` to `to`, or `None` when they coincide.
    #[must_use]
    pub fn direction(from: Position, to: Position) -> Option<Self> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let length = dx.hypot(dy);
        (length > 0.0).then(|| Self::new(dx / length, dy / length))
    }
}

impl std::ops::Add for Velocity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.vx + rhs.vx, self.vy + rhs.vy)
    }
}

impl std::ops::Mul<f32> for Velocity {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.vx * rhs, self.vy * rhs)
    }
}

/// Arena extent used for wraparound. Supplied by the host and may change on resize.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Toroidal correction: an agent that left one edge reappears at the opposite edge.
    ///
    /// Only a single overshoot per axis is corrected, which is all a bounded
    /// per-tick speed can produce. A coordinate sitting exactly on an edge stays put.
    #[must_use]
    pub fn wrap(self, position: Position) -> Position {
        Position::new(
            wrap_axis(position.x, self.width),
            wrap_axis(position.y, self.height),
        )
    }

    /// Whether `position` lies inside the closed arena rectangle.
    #[must_use]
    pub fn contains(self, position: Position) -> bool {
        (0.0..=self.width).contains(&position.x) && (0.0..=self.height).contains(&position.y)
    }
}

fn wrap_axis(value: f32, extent: f32) -> f32 {
    if value < 0.0 {
        value + extent
    } else if value > extent {
        value - extent
    } else {
        value
    }
}

/// Simulation clock (ticks processed since the world was built).
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Ticks elapsed since `earlier`, saturating at zero.
    #[must_use]
    pub const fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_moves_overshoot_to_opposite_edge() {
        let bounds = Bounds::new(800.0, 600.0);
        let wrapped = bounds.wrap(Position::new(805.0, -4.0));
        assert!((wrapped.x - 5.0).abs() < 1e-4);
        assert!((wrapped.y - 596.0).abs() < 1e-4);
        assert!(bounds.contains(wrapped));
    }

    #[test]
    fn wrap_leaves_edges_and_interior_alone() {
        let bounds = Bounds::new(100.0, 50.0);
        assert_eq!(
            bounds.wrap(Position::new(100.0, 0.0)),
            Position::new(100.0, 0.0)
        );
        assert_eq!(
            bounds.wrap(Position::new(42.0, 17.5)),
            Position::new(42.0, 17.5)
        );
    }

    #[test]
    fn clamp_speed_preserves_direction() {
        let clamped = Velocity::new(6.0, 8.0).clamp_speed(2.0);
        assert!((clamped.speed() - 2.0).abs() < 1e-5);
        assert!((clamped.vx - 1.2).abs() < 1e-5);
        assert!((clamped.vy - 1.6).abs() < 1e-5);

        let slow = Velocity::new(0.5, -0.5);
        assert_eq!(slow.clamp_speed(2.0), slow);
    }

    #[test]
    fn direction_is_none_for_coincident_points() {
        let p = Position::new(3.0, 4.0);
        assert!(Velocity::direction(p, p).is_none());
        let dir = Velocity::direction(Position::new(0.0, 0.0), p).expect("direction");
        assert!((dir.speed() - 1.0).abs() < 1e-6);
    }
}
