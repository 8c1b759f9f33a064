//! Local match engine
//!
//! Deterministic stand-in for the game server: generates a board, grows
//! armies, resolves move commands, and produces the same wire-shaped inputs a
//! live server would send (per-player view diffs and leaderboard rows).

use anyhow::{bail, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use annex_core::{
    ring_directions, Color, DiffToken, LeaderboardRow, MapModel, MoveCommand, Position, Tile,
    TileType, DIRECTIONS, NEUTRAL,
};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Strongholds must sit strictly further apart than this (grid distance)
const KING_SPACING: i32 = 6;

/// Attempts per obstacle before generation gives up on the remainder
const OBSTACLE_ATTEMPTS: usize = 3;

/// Attempts to place one stronghold before the board counts as too crowded
const KING_ATTEMPTS: usize = 10_000;

/// Owned plains grow one army every this many turns
const PLAIN_GROWTH_TURNS: u32 = 50;

/// Strongholds and owned cities grow one army every this many turns
const GARRISON_GROWTH_TURNS: u32 = 2;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Board-generation knobs, mirroring the live server's room settings
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Number of players; colors are 1..=players
    pub players: u8,
    /// Board scale; the side grows linearly with it
    pub scale: i32,
    /// Relative weight of mountains among obstacles
    pub mountain: f64,
    /// Relative weight of cities among obstacles
    pub city: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            players: 2,
            scale: 1,
            mountain: 0.5,
            city: 0.5,
        }
    }
}

impl EngineConfig {
    /// Board side length: `ceil(sqrt(players) * 5 + 6 * scale)`
    pub fn side(&self) -> i32 {
        ((self.players as f64).sqrt() * 5.0 + 6.0 * self.scale as f64).ceil() as i32
    }

    /// Mountain and city counts derived from board area and the weights
    fn obstacle_counts(&self) -> (usize, usize) {
        let area = (self.side() * self.side()) as f64;
        let total = self.mountain + self.city;
        if total <= 0.0 {
            return (0, 0);
        }
        let mountains = (area / 4.0 * self.mountain / total).ceil() as usize;
        let cities = (area / 6.0 * self.city / total).ceil() as usize;
        (mountains, cities)
    }
}

/// One player slot and its diff baseline
#[derive(Clone, Debug)]
struct Seat {
    color: Color,
    alive: bool,
    /// View sent last turn; diffs are encoded against it
    view: Option<Vec<Tile>>,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct Engine {
    truth: MapModel,
    seats: Vec<Seat>,
    turn: u32,
}

impl Engine {
    /// Generate a fresh board: strongholds first, then connectivity-checked
    /// mountains and cities
    pub fn generate(config: EngineConfig, seed: u64) -> Result<Self> {
        if config.players < 2 {
            bail!("a match needs at least two players");
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let side = config.side();
        let mut truth = MapModel::new(side, side);
        for pos in truth.positions().collect::<Vec<_>>() {
            truth.set_tile(pos, Tile::new(TileType::Plain, NEUTRAL, 0));
        }

        place_kings(&mut truth, &mut rng, config.players)?;
        let (mountains, cities) = config.obstacle_counts();
        let mountains = place_obstacles(&mut truth, &mut rng, mountains, TileType::Mountain);
        let cities = place_obstacles(&mut truth, &mut rng, cities, TileType::City);
        debug!(side, mountains, cities, "board generated");

        let seats = (1..=config.players)
            .map(|color| Seat {
                color,
                alive: true,
                view: None,
            })
            .collect();
        Ok(Self {
            truth,
            seats,
            turn: 0,
        })
    }

    pub fn width(&self) -> i32 {
        self.truth.width()
    }

    pub fn height(&self) -> i32 {
        self.truth.height()
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_alive(&self, color: Color) -> bool {
        self.seats.iter().any(|s| s.color == color && s.alive)
    }

    /// The last color standing, if the match is decided
    pub fn winner(&self) -> Option<Color> {
        let mut alive = self.seats.iter().filter(|s| s.alive);
        match (alive.next(), alive.next()) {
            (Some(seat), None) => Some(seat.color),
            _ => None,
        }
    }

    /// Advance the turn counter and apply army growth.
    /// Strongholds and owned cities grow on even turns, owned plains every
    /// fiftieth turn.
    pub fn begin_turn(&mut self) {
        self.turn += 1;
        for pos in self.truth.positions().collect::<Vec<_>>() {
            let tile = match self.truth.get(pos) {
                Some(t) => t,
                None => continue,
            };
            let grows = match tile.kind {
                TileType::King => self.turn % GARRISON_GROWTH_TURNS == 0,
                TileType::City => {
                    tile.owner != NEUTRAL && self.turn % GARRISON_GROWTH_TURNS == 0
                }
                TileType::Plain => {
                    tile.owner != NEUTRAL && self.turn % PLAIN_GROWTH_TURNS == 0
                }
                _ => false,
            };
            if grows {
                self.truth
                    .set_tile(pos, Tile::new(tile.kind, tile.owner, tile.army + 1));
            }
        }
    }

    /// Encode this turn's view for `color` against the one sent before,
    /// and store the new baseline
    pub fn view_diff(&mut self, color: Color) -> Vec<DiffToken> {
        let next = view_for(&self.truth, color);
        match self.seats.iter_mut().find(|s| s.color == color) {
            Some(seat) => {
                let tokens = encode_diff(seat.view.as_deref(), &next);
                seat.view = Some(next);
                tokens
            }
            None => encode_diff(None, &next),
        }
    }

    /// Per-color army totals, in color order
    pub fn leaderboard(&self) -> Vec<LeaderboardRow> {
        let mut rows: Vec<LeaderboardRow> = self
            .seats
            .iter()
            .map(|s| LeaderboardRow {
                color: s.color,
                army: 0,
            })
            .collect();
        for pos in self.truth.positions() {
            let tile = match self.truth.get(pos) {
                Some(t) => t,
                None => continue,
            };
            if tile.owner == NEUTRAL {
                continue;
            }
            if let Some(row) = rows.iter_mut().find(|r| r.color == tile.owner) {
                row.army += tile.army;
            }
        }
        rows
    }

    /// Resolve one move command. Invalid commands are dropped, as the live
    /// server drops them; returns whether the move was executed.
    pub fn apply_command(&mut self, color: Color, cmd: &MoveCommand) -> bool {
        if !self.is_alive(color) {
            return false;
        }
        let source = match self.truth.get(cmd.from) {
            Some(t) => t,
            None => return false,
        };
        let target = match self.truth.get(cmd.to) {
            Some(t) => t,
            None => return false,
        };
        if !source.is_owned_by(color)
            || cmd.from.dist(cmd.to) != 1
            || target.kind == TileType::Mountain
        {
            return false;
        }
        let movable = source.army - 1;
        let moving = if cmd.half { (movable + 1) / 2 } else { movable };
        if moving <= 0 {
            return false;
        }

        self.truth.set_tile(
            cmd.from,
            Tile::new(source.kind, source.owner, source.army - moving),
        );
        if target.owner == color {
            self.truth
                .set_tile(cmd.to, Tile::new(target.kind, color, target.army + moving));
        } else if moving > target.army {
            // Breach: the attacker takes the tile with the remainder. A taken
            // stronghold reverts to a city and its color is out.
            let was_king = target.kind == TileType::King;
            let kind = if was_king { TileType::City } else { target.kind };
            self.truth
                .set_tile(cmd.to, Tile::new(kind, color, moving - target.army));
            if was_king && target.owner != NEUTRAL {
                self.dominate(target.owner, color);
            }
        } else {
            self.truth.set_tile(
                cmd.to,
                Tile::new(target.kind, target.owner, target.army - moving),
            );
        }
        true
    }

    /// Transfer a defeated color's land to its captor at half army
    /// (rounded up) and retire the seat
    fn dominate(&mut self, defeated: Color, captor: Color) {
        debug!(defeated, captor, turn = self.turn, "stronghold captured");
        for pos in self.truth.positions().collect::<Vec<_>>() {
            let tile = match self.truth.get(pos) {
                Some(t) => t,
                None => continue,
            };
            if tile.owner == defeated {
                self.truth
                    .set_tile(pos, Tile::new(tile.kind, captor, (tile.army + 1) / 2));
            }
        }
        if let Some(seat) = self.seats.iter_mut().find(|s| s.color == defeated) {
            seat.alive = false;
        }
    }
}

// ============================================================================
// BOARD GENERATION
// ============================================================================

/// Drop one stronghold per color, pairwise further than `KING_SPACING` apart
fn place_kings(truth: &mut MapModel, rng: &mut ChaCha8Rng, players: u8) -> Result<()> {
    let mut kings: Vec<Position> = Vec::new();
    for color in 1..=players {
        let mut placed = None;
        for _ in 0..KING_ATTEMPTS {
            let pos = Position::new(
                rng.gen_range(0..truth.width()),
                rng.gen_range(0..truth.height()),
            );
            let taken = matches!(truth.get(pos), Some(t) if t.kind == TileType::King);
            if taken || kings.iter().any(|k| k.dist(pos) <= KING_SPACING) {
                continue;
            }
            truth.set_tile(pos, Tile::new(TileType::King, color, 1));
            placed = Some(pos);
            break;
        }
        match placed {
            Some(pos) => kings.push(pos),
            None => bail!(
                "no room for {} strongholds on a {}x{} board",
                players,
                truth.width(),
                truth.height()
            ),
        }
    }
    Ok(())
}

/// Scatter obstacles one at a time, rejecting any placement that cuts the
/// passable region apart. Returns how many were actually placed; a board too
/// tight for the full count just gets fewer.
fn place_obstacles(
    truth: &mut MapModel,
    rng: &mut ChaCha8Rng,
    count: usize,
    kind: TileType,
) -> usize {
    for placed in 0..count {
        let mut ok = false;
        for _ in 0..OBSTACLE_ATTEMPTS {
            let plains: Vec<Position> = truth
                .positions()
                .filter(|&p| matches!(truth.get(p), Some(t) if t.kind == TileType::Plain))
                .collect();
            let pos = match plains.choose(rng) {
                Some(&p) => p,
                None => return placed,
            };
            let garrison = if kind == TileType::City {
                rng.gen_range(35..55)
            } else {
                0
            };
            truth.set_tile(pos, Tile::new(kind, NEUTRAL, garrison));
            if passable_connected(truth) {
                ok = true;
                break;
            }
            truth.set_tile(pos, Tile::new(TileType::Plain, NEUTRAL, 0));
        }
        if !ok {
            debug!(?kind, placed, wanted = count, "obstacle placement stopped early");
            return placed;
        }
    }
    count
}

/// Neutral cities count as walls during generation, exactly like mountains
fn is_open(tile: Tile) -> bool {
    !matches!(tile.kind, TileType::Mountain | TileType::City)
}

/// Does every open cell sit in one connected region?
fn passable_connected(truth: &MapModel) -> bool {
    let open: Vec<Position> = truth
        .positions()
        .filter(|&p| matches!(truth.get(p), Some(t) if is_open(t)))
        .collect();
    let start = match open.first() {
        Some(&p) => p,
        None => return true,
    };

    let mut visited = vec![false; truth.area()];
    let mut frontier = vec![start];
    visited[truth.index(start)] = true;
    let mut reached = 1;
    while let Some(pos) = frontier.pop() {
        for dir in DIRECTIONS {
            let next = pos.step(dir);
            let tile = match truth.get(next) {
                Some(t) => t,
                None => continue,
            };
            let idx = truth.index(next);
            if visited[idx] || !is_open(tile) {
                continue;
            }
            visited[idx] = true;
            reached += 1;
            frontier.push(next);
        }
    }
    reached == open.len()
}

// ============================================================================
// FOG AND DIFF ENCODING
// ============================================================================

/// One color's fogged view: own tiles and their 8-neighborhoods are real,
/// everything else arrives as Fog (Obstacle for mountains and cities)
fn view_for(truth: &MapModel, color: Color) -> Vec<Tile> {
    let mut view: Vec<Tile> = truth
        .positions()
        .map(|pos| match truth.get(pos) {
            Some(t) if matches!(t.kind, TileType::Mountain | TileType::City) => {
                Tile::new(TileType::Obstacle, NEUTRAL, 0)
            }
            _ => Tile::fog(),
        })
        .collect();
    for pos in truth.positions() {
        let tile = match truth.get(pos) {
            Some(t) => t,
            None => continue,
        };
        if !tile.is_owned_by(color) {
            continue;
        }
        view[truth.index(pos)] = tile;
        for dir in ring_directions() {
            let near = pos.step(dir);
            if let Some(t) = truth.get(near) {
                view[truth.index(near)] = t;
            }
        }
    }
    view
}

/// Run-length encode a view against its predecessor.
/// With no predecessor every cell is sent literally.
fn encode_diff(prev: Option<&[Tile]>, next: &[Tile]) -> Vec<DiffToken> {
    let prev = match prev {
        Some(p) if p.len() == next.len() => p,
        _ => return next.iter().map(|&t| DiffToken::Tile(t)).collect(),
    };
    let mut tokens = Vec::new();
    let mut run: u32 = 0;
    for (&old, &new) in prev.iter().zip(next.iter()) {
        if old == new {
            run += 1;
        } else {
            if run > 0 {
                tokens.push(DiffToken::Skip(run));
                run = 0;
            }
            tokens.push(DiffToken::Tile(new));
        }
    }
    if run > 0 {
        tokens.push(DiffToken::Skip(run));
    }
    tokens
}

// ============================================================================
// TESTS
// ============================================================================
