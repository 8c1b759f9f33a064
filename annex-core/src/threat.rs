//! Threat detection around the stronghold

use std::collections::VecDeque;

use tracing::debug;

use crate::grid::{Position, DIRECTIONS};
use crate::map::MapModel;
use crate::tile::{Color, Tile};

/// A hostile stack scored by garrison size against stronghold distance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreatCandidate {
    pub tile: Tile,
    pub pos: Position,
    pub score: i32,
}

/// Scan the revealed, reachable region around the stronghold for the most
/// pressing hostile stack.
///
/// Breadth-first over revealed, movable tiles (cities are corridors here),
/// each visited at most once. Every hostile tile scores
/// `army - dist(stronghold, tile)`; the best score wins and ties go to the
/// candidate discovered last.
pub fn detect(map: &MapModel, me: Color, stronghold: Position) -> Option<ThreatCandidate> {
    if !map.in_bounds(stronghold) {
        return None;
    }
    let mut visited = vec![false; map.area()];
    visited[map.index(stronghold)] = true;
    let mut frontier = VecDeque::new();
    frontier.push_back(stronghold);

    let mut best: Option<ThreatCandidate> = None;
    while let Some(a) = frontier.pop_front() {
        for dir in DIRECTIONS {
            let b = a.step(dir);
            let tile = match map.get(b) {
                Some(t) => t,
                None => continue,
            };
            if !tile.is_revealed() || tile.impassable(false) {
                continue;
            }
            let b_idx = map.index(b);
            if visited[b_idx] {
                continue;
            }
            visited[b_idx] = true;
            if tile.is_hostile(me) {
                let score = tile.army - stronghold.dist(b);
                if best.map_or(true, |t| score >= t.score) {
                    best = Some(ThreatCandidate { tile, pos: b, score });
                }
            }
            frontier.push_back(b);
        }
    }

    if let Some(t) = &best {
        debug!(
            score = t.score,
            x = t.pos.x,
            y = t.pos.y,
            color = t.tile.owner,
            "threat detected"
        );
    }
    best
}
