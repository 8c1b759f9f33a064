//! The per-turn decision core
//!
//! One [`Bot`] per player, owning every piece of match state: map view,
//! visibility, stronghold registry, pending orders, pursuit, leaderboard,
//! RNG. Each delivered turn runs one decision cycle through a fixed priority
//! ladder; the first branch with something to say ends the turn, and at most
//! one move comes out.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::expand::{conquer_city, expand_land};
use crate::grid::{ring_directions, Position, DIRECTIONS};
use crate::map::{GeneralRegistry, MapModel};
use crate::patch::{self, DiffError, DiffToken};
use crate::queue::{MoveOrder, MoveQueue, Purpose};
use crate::search::{gather, quick_expand};
use crate::threat;
use crate::tile::Color;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Turn cadence of the quick-expand probe; routine land claims start once
/// this many turns have passed
const EXPAND_CADENCE: u32 = 17;

/// Priority of stronghold-defense gathers
const DEFENSE_PRIORITY: i32 = 999;

/// Hop limit of stronghold-defense gathers
const DEFENSE_HOPS: usize = 10;

/// Hop limit of threat-response gathers
const THREAT_HOPS: usize = 25;

/// Priorities of the pilot and full-force strikes on a known stronghold
const STRIKE_PILOT_PRIORITY: i32 = 5;
const STRIKE_PRIORITY: i32 = 100;

/// Pursuit steps outrank everything else in the queue
const PURSUIT_PRIORITY: i32 = 999;

/// Army-total factor above which a threat's owner counts as out of reach
const OUTMATCH_MARGIN: f64 = 1.1;

// ============================================================================
// CONFIG
// ============================================================================

/// Agent configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotConfig {
    pub color: Color,
    /// Fixed RNG seed for reproducible play; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl BotConfig {
    pub fn new(color: Color) -> Self {
        Self { color, seed: None }
    }

    pub fn with_seed(color: Color, seed: u64) -> Self {
        Self {
            color,
            seed: Some(seed),
        }
    }
}

/// One row of the per-turn leaderboard
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub color: Color,
    pub army: i32,
}

/// An in-progress chase of a hostile color
#[derive(Clone, Copy, Debug)]
struct Pursuit {
    color: Color,
    frontier: Position,
}

// ============================================================================
// BOT
// ============================================================================

pub struct Bot {
    color: Color,
    map: MapModel,
    registry: GeneralRegistry,
    queue: MoveQueue,
    pursuit: Option<Pursuit>,
    armies: FxHashMap<Color, i32>,
    rng: ChaCha8Rng,
}

impl Bot {
    pub fn new(config: BotConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            color: config.color,
            map: MapModel::new(0, 0),
            registry: GeneralRegistry::default(),
            queue: MoveQueue::default(),
            pursuit: None,
            armies: FxHashMap::default(),
            rng,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn map(&self) -> &MapModel {
        &self.map
    }

    pub fn registry(&self) -> &GeneralRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &MoveQueue {
        &self.queue
    }

    pub fn stronghold(&self) -> Option<Position> {
        self.registry.own()
    }

    /// Allocate the grid and reset all per-match state; called once at
    /// match start
    pub fn init_map(&mut self, width: i32, height: i32) {
        self.map = MapModel::new(width, height);
        self.registry.clear();
        self.queue.clear();
        self.pursuit = None;
        self.armies.clear();
    }

    /// Apply the per-turn map diff
    pub fn apply_diff(&mut self, tokens: &[DiffToken]) -> Result<(), DiffError> {
        patch::apply_diff(&mut self.map, &mut self.registry, self.color, tokens)
    }

    /// Record the latest per-color army totals
    pub fn update_leaderboard(&mut self, rows: &[LeaderboardRow]) {
        self.armies.clear();
        for row in rows {
            self.armies.insert(row.color, row.army);
        }
    }

    /// Does `enemy` out-army us beyond the caution margin?
    /// Unknown totals count as no.
    fn is_outmatched(&self, enemy: Color) -> bool {
        match (self.armies.get(&enemy), self.armies.get(&self.color)) {
            (Some(&theirs), Some(&mine)) => theirs as f64 > mine as f64 * OUTMATCH_MARGIN,
            _ => false,
        }
    }

    // ========================================================================
    // TURN CYCLE
    // ========================================================================

    /// Run one decision cycle. At most one move comes out; `None` means the
    /// turn went into planning, or there was nothing to do.
    pub fn compute_next_move(&mut self, turn: u32) -> Option<MoveOrder> {
        // 1. Pending orders go out first.
        if let Some(order) = self.queue.pop_ready(&self.map, self.color) {
            trace!(turn, ?order, "emitting queued order");
            return Some(order);
        }

        let stronghold = self.registry.own()?;

        // 2. A known hostile stronghold overrides everything: drop current
        // plans and mass on it.
        if !self.registry.hostiles().is_empty() {
            self.queue.clear();
            let limit = (2 * (self.map.width() + self.map.height())) as usize;
            let mut booked = false;
            for g in self.registry.hostiles() {
                booked |= gather(
                    &self.map,
                    self.color,
                    &mut self.queue,
                    Purpose::AttackGeneral,
                    STRIKE_PILOT_PRIORITY,
                    g.pos,
                    limit,
                );
                booked |= gather(
                    &self.map,
                    self.color,
                    &mut self.queue,
                    Purpose::AttackGeneral,
                    STRIKE_PRIORITY,
                    g.pos,
                    limit,
                );
            }
            if booked {
                debug!(turn, "strike on known stronghold planned");
            } else {
                // Not enough army anywhere; keep growing instead of stalling.
                self.periodic_expansion(turn, stronghold);
            }
            return None;
        }

        // 3. Hostiles adjacent to the stronghold trigger an urgent defense.
        if self.defend_stronghold(stronghold) {
            return None;
        }

        // 4. Keep an active chase moving.
        if self.advance_pursuit() {
            return None;
        }

        // 5. Respond to the most pressing reachable hostile stack.
        if self.respond_to_threat(turn, stronghold) {
            return None;
        }

        // 6. Nothing urgent: grow.
        self.periodic_expansion(turn, stronghold);
        None
    }

    /// 8-neighborhood check; an intruder next door triggers urgent gathers
    /// toward the intruding tile and then toward the stronghold itself
    fn defend_stronghold(&mut self, stronghold: Position) -> bool {
        for dir in ring_directions() {
            let pos = stronghold.step(dir);
            let tile = match self.map.get(pos) {
                Some(t) => t,
                None => continue,
            };
            if !tile.is_hostile(self.color) {
                continue;
            }
            debug!(
                intruder = tile.owner,
                x = pos.x,
                y = pos.y,
                "stronghold under pressure"
            );
            gather(
                &self.map,
                self.color,
                &mut self.queue,
                Purpose::Defend,
                DEFENSE_PRIORITY,
                pos,
                DEFENSE_HOPS,
            );
            gather(
                &self.map,
                self.color,
                &mut self.queue,
                Purpose::Defend,
                DEFENSE_PRIORITY,
                stronghold,
                DEFENSE_HOPS,
            );
            return true;
        }
        false
    }

    /// Push the chase one tile deeper into the pursued color's territory.
    /// Returns false when the chase is over (and clears it).
    fn advance_pursuit(&mut self) -> bool {
        let pursuit = match self.pursuit {
            Some(p) => p,
            None => return false,
        };
        let holding = self
            .map
            .get(pursuit.frontier)
            .is_some_and(|t| t.is_owned_by(self.color));
        if holding {
            let next = self
                .pursuit_step(pursuit, true)
                .or_else(|| self.pursuit_step(pursuit, false));
            if let Some(next) = next {
                self.queue.push(MoveOrder {
                    from: pursuit.frontier,
                    to: next,
                    purpose: Purpose::Attack,
                    priority: PURSUIT_PRIORITY,
                    target: next,
                });
                self.pursuit = Some(Pursuit {
                    color: pursuit.color,
                    frontier: next,
                });
                trace!(x = next.x, y = next.y, "pursuit advanced");
                return true;
            }
        }
        debug!(color = pursuit.color, "pursuit dropped");
        self.pursuit = None;
        false
    }

    /// One scan around the pursuit frontier for a tile of the pursued color.
    /// The probing pass restricts itself to never-seen tiles and treats
    /// cities as walls; the follow-up pass lifts both restrictions.
    fn pursuit_step(&mut self, pursuit: Pursuit, probing: bool) -> Option<Position> {
        let mut dirs = DIRECTIONS;
        dirs.shuffle(&mut self.rng);
        for dir in dirs {
            let pos = pursuit.frontier.step(dir);
            let tile = match self.map.get(pos) {
                Some(t) => t,
                None => continue,
            };
            if probing {
                if tile.impassable(true) || self.map.seen(pos) {
                    continue;
                }
            } else if tile.impassable(false) {
                continue;
            }
            if tile.is_owned_by(pursuit.color) {
                return Some(pos);
            }
        }
        None
    }

    /// Threat scan and response: defend-gather toward the worst threat and
    /// start chasing it. When the threat's owner simply out-armies us, half
    /// the time the answer is to grow instead.
    fn respond_to_threat(&mut self, turn: u32, stronghold: Position) -> bool {
        let threat = match threat::detect(&self.map, self.color, stronghold) {
            Some(t) => t,
            None => return false,
        };
        if self.is_outmatched(threat.tile.owner) && self.rng.gen_bool(0.5) {
            debug!(enemy = threat.tile.owner, "outmatched, growing instead");
            self.periodic_expansion(turn, stronghold);
            return true;
        }
        gather(
            &self.map,
            self.color,
            &mut self.queue,
            Purpose::Defend,
            threat.score,
            threat.pos,
            THREAT_HOPS,
        );
        self.pursuit = Some(Pursuit {
            color: threat.tile.owner,
            frontier: threat.pos,
        });
        true
    }

    /// Quick-expand on the probe cadence, routine land claims after the
    /// opening, and a push for a city when neither found anything
    fn periodic_expansion(&mut self, turn: u32, stronghold: Position) {
        let mut expanded = false;
        if (turn + 1) % EXPAND_CADENCE == 0 {
            expanded = quick_expand(
                &self.map,
                self.color,
                &mut self.queue,
                &mut self.rng,
                stronghold,
            );
        } else if turn + 1 > EXPAND_CADENCE {
            expanded = expand_land(&self.map, self.color, &mut self.queue, &mut self.rng);
        }
        if !expanded {
            conquer_city(&self.map, self.color, &mut self.queue, stronghold);
        }
    }
}
