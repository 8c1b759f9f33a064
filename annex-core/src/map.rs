//! Map state: tile grid, visibility mask, known strongholds

use tracing::debug;

use crate::grid::Position;
use crate::tile::{Color, Tile, TileType};

/// The agent's view of the game map.
///
/// Tiles live in a flat vector indexed `x * height + y`; dimensions are fixed
/// at game start. The visibility mask is monotonic: once a cell has been
/// revealed it stays marked even if the server fogs it again later.
#[derive(Clone, Debug)]
pub struct MapModel {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    seen: Vec<bool>,
}

impl MapModel {
    pub fn new(width: i32, height: i32) -> Self {
        let n = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            tiles: vec![Tile::fog(); n],
            seen: vec![false; n],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells
    pub fn area(&self) -> usize {
        self.tiles.len()
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Flattened index of an in-bounds position
    pub fn index(&self, pos: Position) -> usize {
        (pos.x * self.height + pos.y) as usize
    }

    /// Position of a flattened index
    pub fn position(&self, idx: usize) -> Position {
        Position::new(idx as i32 / self.height, idx as i32 % self.height)
    }

    pub fn get(&self, pos: Position) -> Option<Tile> {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            Some(self.tiles[idx])
        } else {
            None
        }
    }

    pub fn set_tile(&mut self, pos: Position, tile: Tile) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.tiles[idx] = tile;
        }
    }

    pub(crate) fn tile_at(&self, idx: usize) -> Tile {
        self.tiles[idx]
    }

    pub(crate) fn replace_at(&mut self, idx: usize, tile: Tile) {
        self.tiles[idx] = tile;
    }

    /// Has this cell ever been revealed?
    pub fn seen(&self, pos: Position) -> bool {
        self.in_bounds(pos) && self.seen[self.index(pos)]
    }

    pub(crate) fn refresh_seen(&mut self) {
        for idx in 0..self.tiles.len() {
            if !self.seen[idx] && self.tiles[idx].is_revealed() {
                self.seen[idx] = true;
            }
        }
    }

    /// All positions in flattened order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.area()).map(|idx| self.position(idx))
    }
}

// ====== STRONGHOLD REGISTRY ======

/// A sighted hostile stronghold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostileGeneral {
    pub pos: Position,
    pub color: Color,
}

/// Known stronghold positions, own and hostile.
/// Hostile entries are unique per color.
#[derive(Clone, Debug, Default)]
pub struct GeneralRegistry {
    own: Option<Position>,
    hostiles: Vec<HostileGeneral>,
}

impl GeneralRegistry {
    pub fn own(&self) -> Option<Position> {
        self.own
    }

    pub fn hostiles(&self) -> &[HostileGeneral] {
        &self.hostiles
    }

    pub fn record_own(&mut self, pos: Position) {
        self.own = Some(pos);
    }

    /// Register a hostile stronghold unless its color is already known
    pub fn record_hostile(&mut self, pos: Position, color: Color) {
        if !self.hostiles.iter().any(|g| g.color == color) {
            debug!(color, x = pos.x, y = pos.y, "hostile stronghold sighted");
            self.hostiles.push(HostileGeneral { pos, color });
        }
    }

    /// Drop entries whose tile no longer shows their color or has re-fogged
    pub fn retire_stale(&mut self, map: &MapModel) {
        self.hostiles.retain(|g| {
            let keep = match map.get(g.pos) {
                Some(t) => t.owner == g.color && t.kind != TileType::Fog,
                None => false,
            };
            if !keep {
                debug!(color = g.color, "hostile stronghold retired");
            }
            keep
        });
    }

    pub fn clear(&mut self) {
        self.own = None;
        self.hostiles.clear();
    }
}
