//! Coordinate types for worlds, cells, and spawn positions.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Identifier for a world (dimension) hosted by the embedding process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldId(String);

impl WorldId {
    /// Creates a world ID from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the world name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorldId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

/// Discrete cell coordinate within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPos {
    /// X coordinate in cell space
    pub x: i32,
    /// Y coordinate (altitude) in cell space
    pub y: i32,
    /// Z coordinate in cell space
    pub z: i32,
}

/// The 8 horizontal neighbor offsets (cardinals plus diagonals).
pub const HORIZONTAL_NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

impl CellPos {
    /// Creates a new cell position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns this cell offset by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Returns the cell `n` cells above.
    #[must_use]
    pub const fn above(self, n: i32) -> Self {
        self.offset(0, n, 0)
    }

    /// Returns the cell `n` cells below.
    #[must_use]
    pub const fn below(self, n: i32) -> Self {
        self.offset(0, -n, 0)
    }

    /// Center of this cell as a continuous position, offset one cell up so
    /// an actor placed there stands on top of the cell.
    #[must_use]
    pub fn stand_position(self) -> DVec3 {
        DVec3::new(
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 1.0,
            f64::from(self.z) + 0.5,
        )
    }

    /// Center of this cell as a continuous position.
    #[must_use]
    pub fn center(self) -> DVec3 {
        DVec3::new(
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 0.5,
            f64::from(self.z) + 0.5,
        )
    }

    /// Horizontal (XZ-plane) distance to another cell.
    #[must_use]
    pub fn horizontal_distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dz = f64::from(self.z - other.z);
        dx.hypot(dz)
    }
}

impl std::fmt::Display for CellPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
