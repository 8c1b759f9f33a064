//! Grid geometry: positions, direction tables, distances

use serde::{Deserialize, Serialize};

/// A square-grid coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two positions
    pub fn dist(&self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Neighbor offset by a direction vector
    pub fn step(&self, dir: (i32, i32)) -> Position {
        Position::new(self.x + dir.0, self.y + dir.1)
    }
}

/// Orthogonal direction vectors (dx, dy)
/// Index: 0=W, 1=N, 2=E, 3=S
pub const DIRECTIONS: [(i32, i32); 4] = [
    (-1, 0), // W
    (0, -1), // N
    (1, 0),  // E
    (0, 1),  // S
];

/// Diagonal direction vectors (dx, dy)
pub const DIAGONALS: [(i32, i32); 4] = [
    (-1, -1), // NW
    (1, -1),  // NE
    (1, 1),   // SE
    (-1, 1),  // SW
];

/// All eight surrounding offsets, orthogonals first
pub fn ring_directions() -> impl Iterator<Item = (i32, i32)> {
    DIRECTIONS.iter().chain(DIAGONALS.iter()).copied()
}
