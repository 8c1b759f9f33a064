//! ANNEX Core - Decision engine for fog-of-war territory conquest
//!
//! This crate provides the per-turn decision logic for an autonomous agent:
//! - Grid geometry and tile model
//! - Incremental map patching with a monotonic visibility mask
//! - Stronghold registry and threat detection
//! - Greedy path valuation searches (gather / quick expand)
//! - Land and city expansion
//! - The priority-ladder turn controller

pub mod grid;
pub mod tile;
pub mod map;
pub mod patch;
pub mod queue;
pub mod search;
pub mod threat;
pub mod expand;
pub mod bot;

// Re-exports for convenient access
pub use grid::{ring_directions, Position, DIAGONALS, DIRECTIONS};
pub use tile::{Color, Tile, TileType, NEUTRAL};
pub use map::{GeneralRegistry, HostileGeneral, MapModel};
pub use patch::{DiffError, DiffToken};
pub use queue::{MoveCommand, MoveOrder, MoveQueue, Purpose};
pub use threat::ThreatCandidate;
pub use bot::{Bot, BotConfig, LeaderboardRow};
