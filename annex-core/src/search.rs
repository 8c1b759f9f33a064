//! Path valuation searches
//!
//! Both searches run the same bounded greedy relaxation: every cell keeps the
//! best known net-army value of a path reaching it from the root (own armies
//! add, hostile armies and each hop subtract), values spread breadth-first
//! with strict-improvement updates, and a cell stops accepting updates once
//! it has been expanded. First-settled values can be sub-optimal; that greedy
//! behavior is part of the decision contract, not something to tighten.

use std::collections::VecDeque;

use rand::Rng;
use tracing::debug;

use crate::grid::{Position, DIRECTIONS};
use crate::map::MapModel;
use crate::queue::{MoveOrder, MoveQueue, Purpose};
use crate::tile::{Color, TileType};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Value of cells no path has reached
const UNREACHED: i32 = -9_999_999;

/// Priority of orders produced by the quick-expand probe
const QUICK_EXPAND_PRIORITY: i32 = 50;

/// Chance that a later qualifying candidate displaces the current
/// quick-expand pick
const QUICK_EXPAND_SWAP: f64 = 0.7;

// ============================================================================
// RELAXATION
// ============================================================================

/// Per-cell relaxation state
#[derive(Clone, Debug)]
struct Cell {
    value: i32,
    /// Root-first tile sequence realizing `value`; empty when unreached
    path: Vec<Position>,
    settled: bool,
}

/// Run the relaxation from `root`, expanding at most `hop_limit` hops.
///
/// The root is seeded with its own garrison: positive when agent-owned,
/// negative otherwise. Unowned cities block traversal, so only the root
/// itself may be a city the agent does not hold.
fn sweep(map: &MapModel, me: Color, root: Position, hop_limit: usize) -> Vec<Cell> {
    let mut cells = vec![
        Cell {
            value: UNREACHED,
            path: Vec::new(),
            settled: false,
        };
        map.area()
    ];

    let root_idx = map.index(root);
    let root_tile = map.tile_at(root_idx);
    cells[root_idx].value = if root_tile.is_owned_by(me) {
        root_tile.army
    } else {
        -root_tile.army
    };
    cells[root_idx].path = vec![root];

    let mut frontier: VecDeque<(Position, usize)> = VecDeque::new();
    frontier.push_back((root, 0));
    while let Some((a, step)) = frontier.pop_front() {
        let a_idx = map.index(a);
        cells[a_idx].settled = true;
        if step >= hop_limit {
            break;
        }
        let a_value = cells[a_idx].value;
        for dir in DIRECTIONS {
            let b = a.step(dir);
            let tile = match map.get(b) {
                Some(t) => t,
                None => continue,
            };
            if tile.impassable(false) {
                continue;
            }
            let b_idx = map.index(b);
            if cells[b_idx].settled {
                continue;
            }
            let mut value = a_value - 1;
            if tile.is_owned_by(me) {
                value += tile.army;
            } else {
                if tile.kind == TileType::City {
                    continue;
                }
                value -= tile.army;
            }
            if value <= cells[b_idx].value {
                continue;
            }
            let mut path = cells[a_idx].path.clone();
            path.push(b);
            cells[b_idx].value = value;
            cells[b_idx].path = path;
            frontier.push_back((b, step + 1));
        }
    }
    cells
}

/// Recompute a root-first path's net value directly from the map.
/// Mirrors the relaxation arithmetic; useful for checking recorded plans.
pub fn path_value(map: &MapModel, me: Color, path: &[Position]) -> i32 {
    let mut total = 0;
    for (i, &pos) in path.iter().enumerate() {
        let tile = match map.get(pos) {
            Some(t) => t,
            None => return UNREACHED,
        };
        let garrison = if tile.is_owned_by(me) {
            tile.army
        } else {
            -tile.army
        };
        if i == 0 {
            total = garrison;
        } else {
            total += garrison - 1;
        }
    }
    total
}

// ============================================================================
// GATHER
// ============================================================================

/// Plan a chain of single-step transfers that masses army onto `target`.
///
/// The relaxation is rooted at the target; the best positive-value cell marks
/// where the march starts, and its recorded path is reversed into orders that
/// walk the massed army home. Returns true when a plan was enqueued; no
/// positive-value cell means the gather is hopeless (or the target is out of
/// range) and nothing is queued.
pub fn gather(
    map: &MapModel,
    me: Color,
    queue: &mut MoveQueue,
    purpose: Purpose,
    priority: i32,
    target: Position,
    hop_limit: usize,
) -> bool {
    if !map.in_bounds(target) {
        return false;
    }
    let cells = sweep(map, me, target, hop_limit);

    let mut best: Option<usize> = None;
    let mut best_value = 0;
    for (idx, cell) in cells.iter().enumerate() {
        if cell.value > best_value {
            best_value = cell.value;
            best = Some(idx);
        }
    }
    let best_idx = match best {
        Some(idx) => idx,
        None => return false,
    };

    let path = &cells[best_idx].path;
    let mut prev: Option<Position> = None;
    for &pos in path.iter().rev() {
        if let Some(from) = prev {
            queue.push(MoveOrder {
                from,
                to: pos,
                purpose,
                priority,
                target,
            });
        }
        prev = Some(pos);
    }
    debug!(
        ?purpose,
        priority,
        value = best_value,
        hops = path.len().saturating_sub(1),
        "gather plan enqueued"
    );
    true
}

// ============================================================================
// QUICK EXPAND
// ============================================================================

/// Probe for a profitable push from the stronghold into unseen territory.
///
/// Full-region sweep rooted at the stronghold; qualifying cells have positive
/// value and a path ending outside the visibility mask. The pick streams over
/// candidates in flattened order: the first qualifies outright, each later
/// one displaces it with a fixed chance, biasing toward cells discovered late
/// in the scan. Orders run forward from the stronghold to the chosen
/// endpoint.
pub fn quick_expand<R: Rng>(
    map: &MapModel,
    me: Color,
    queue: &mut MoveQueue,
    rng: &mut R,
    stronghold: Position,
) -> bool {
    if !map.in_bounds(stronghold) {
        return false;
    }
    let cells = sweep(map, me, stronghold, usize::MAX);

    let mut pick: Option<usize> = None;
    for (idx, cell) in cells.iter().enumerate() {
        if cell.value <= 0 {
            continue;
        }
        let endpoint = match cell.path.last() {
            Some(&p) => p,
            None => continue,
        };
        if map.seen(endpoint) {
            continue;
        }
        if pick.is_none() || rng.gen_bool(QUICK_EXPAND_SWAP) {
            pick = Some(idx);
        }
    }
    let pick_idx = match pick {
        Some(idx) => idx,
        None => return false,
    };

    let path = &cells[pick_idx].path;
    let target = match path.last() {
        Some(&p) => p,
        None => return false,
    };
    let mut prev: Option<Position> = None;
    for &pos in path.iter() {
        if let Some(from) = prev {
            queue.push(MoveOrder {
                from,
                to: pos,
                purpose: Purpose::ExpandLand,
                priority: QUICK_EXPAND_PRIORITY,
                target,
            });
        }
        prev = Some(pos);
    }
    debug!(
        value = cells[pick_idx].value,
        x = target.x,
        y = target.y,
        "quick expand probe enqueued"
    );
    true
}
