//! Land and city expansion

use rand::prelude::*;

use crate::grid::Position;
use crate::map::MapModel;
use crate::queue::{MoveQueue, Purpose};
use crate::search::gather;
use crate::tile::{Color, TileType};

/// Priority of routine land-claim orders
const EXPAND_PRIORITY: i32 = 10;

/// Hop limit of the forced fallback gather when no 1-hop claim lands
const EXPAND_FALLBACK_HOPS: usize = 10;

/// Priority of city-conquest orders
const CITY_PRIORITY: i32 = 1;

/// Hop limit when massing onto a city
const CITY_HOPS: usize = 34;

/// Claim whatever unowned plains are within a single hop.
///
/// Every unowned plain gets a 1-hop gather attempt in shuffled order, so all
/// immediately winnable captures are queued at once. If none lands, one
/// deeper gather is forced toward the first shuffled tile.
pub fn expand_land<R: Rng>(
    map: &MapModel,
    me: Color,
    queue: &mut MoveQueue,
    rng: &mut R,
) -> bool {
    let mut tiles: Vec<Position> = map
        .positions()
        .filter(|&p| match map.get(p) {
            Some(t) => t.kind == TileType::Plain && !t.is_owned_by(me),
            None => false,
        })
        .collect();
    if tiles.is_empty() {
        return false;
    }
    tiles.shuffle(rng);

    let mut claimed = false;
    for &tile in &tiles {
        if gather(map, me, queue, Purpose::ExpandLand, EXPAND_PRIORITY, tile, 1) {
            claimed = true;
        }
    }
    if claimed {
        return true;
    }
    gather(
        map,
        me,
        queue,
        Purpose::ExpandLand,
        EXPAND_PRIORITY,
        tiles[0],
        EXPAND_FALLBACK_HOPS,
    )
}

/// March on the cheapest visible city: smallest garrison plus distance from
/// the stronghold. No city in sight is a no-op.
pub fn conquer_city(
    map: &MapModel,
    me: Color,
    queue: &mut MoveQueue,
    stronghold: Position,
) -> bool {
    let mut best: Option<(i32, Position)> = None;
    for pos in map.positions() {
        let tile = match map.get(pos) {
            Some(t) => t,
            None => continue,
        };
        if tile.kind != TileType::City || tile.is_owned_by(me) {
            continue;
        }
        let cost = tile.army + stronghold.dist(pos);
        if best.map_or(true, |(c, _)| cost < c) {
            best = Some((cost, pos));
        }
    }
    match best {
        Some((_, city)) => gather(
            map,
            me,
            queue,
            Purpose::ExpandCity,
            CITY_PRIORITY,
            city,
            CITY_HOPS,
        ),
        None => false,
    }
}
