//! Tile and ownership definitions

use serde::{Deserialize, Serialize};

/// Player color identifier
pub type Color = u8;

/// Owner of unclaimed tiles
pub const NEUTRAL: Color = 0;

/// Terrain/content classification of a map cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileType {
    Fog,      // Unrevealed open terrain
    Obstacle, // Unrevealed blocker (mountain or city under fog)
    Mountain, // Revealed, never passable
    City,     // Revealed, passable only once owned
    Plain,    // Revealed open terrain
    King,     // A player's stronghold
}

/// One map cell: terrain, owner, garrison
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileType,
    pub owner: Color,
    pub army: i32,
}

impl Tile {
    pub const fn new(kind: TileType, owner: Color, army: i32) -> Self {
        Self { kind, owner, army }
    }

    /// An unrevealed cell
    pub const fn fog() -> Self {
        Self::new(TileType::Fog, NEUTRAL, 0)
    }

    /// True once the cell has been seen (not Fog/Obstacle)
    pub fn is_revealed(&self) -> bool {
        !matches!(self.kind, TileType::Fog | TileType::Obstacle)
    }

    /// True if movement into this cell is blocked.
    /// Mountains and obstacles always block; cities block when `city_blocks`.
    pub fn impassable(&self, city_blocks: bool) -> bool {
        match self.kind {
            TileType::Mountain | TileType::Obstacle => true,
            TileType::City => city_blocks,
            _ => false,
        }
    }

    pub fn is_owned_by(&self, color: Color) -> bool {
        self.owner == color
    }

    /// Owned by some player other than `me`
    pub fn is_hostile(&self, me: Color) -> bool {
        self.owner != NEUTRAL && self.owner != me
    }
}
