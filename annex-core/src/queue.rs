//! Move orders and the pending-order queue

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::grid::Position;
use crate::map::MapModel;
use crate::tile::Color;

/// Why an order was enqueued; drives the goal-achieved drop rule
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Purpose {
    Defend,
    AttackGeneral,
    ExpandLand,
    ExpandCity,
    Attack,
}

impl Purpose {
    /// Purposes whose orders become moot once the plan target is owned.
    /// Attack chases a moving frontier and ExpandCity targets a tile that
    /// stays worth garrisoning, so both survive target capture.
    fn drops_on_target_owned(&self) -> bool {
        matches!(self, Purpose::Defend | Purpose::AttackGeneral | Purpose::ExpandLand)
    }
}

/// One single-step move belonging to a multi-step plan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveOrder {
    pub from: Position,
    pub to: Position,
    pub purpose: Purpose,
    pub priority: i32,
    /// Final destination of the plan this step belongs to
    pub target: Position,
}

impl MoveOrder {
    /// Wire form sent to the server
    pub fn command(&self) -> MoveCommand {
        MoveCommand {
            from: self.from,
            to: self.to,
            half: false,
        }
    }
}

/// An emitted move as the server expects it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCommand {
    pub from: Position,
    pub to: Position,
    /// Half-army split; this agent never splits
    pub half: bool,
}

/// FIFO of pending single-step orders.
///
/// Orders go stale while queued: the source tile can be lost to an enemy, or
/// the plan's target can already be captured. Both checks happen at pop time
/// against the current map.
#[derive(Clone, Debug, Default)]
pub struct MoveQueue {
    orders: VecDeque<MoveOrder>,
}

impl MoveQueue {
    pub fn push(&mut self, order: MoveOrder) {
        self.orders.push_back(order);
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveOrder> {
        self.orders.iter()
    }

    /// Discard stale orders from the front and pop the first usable one
    pub fn pop_ready(&mut self, map: &MapModel, me: Color) -> Option<MoveOrder> {
        while let Some(order) = self.orders.pop_front() {
            let source_held = map.get(order.from).is_some_and(|t| t.is_owned_by(me));
            if !source_held {
                continue;
            }
            let goal_done = order.purpose.drops_on_target_owned()
                && map.get(order.target).is_some_and(|t| t.is_owned_by(me));
            if goal_done {
                continue;
            }
            return Some(order);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Tile, TileType, NEUTRAL};

    fn order(from: (i32, i32), to: (i32, i32), purpose: Purpose, target: (i32, i32)) -> MoveOrder {
        MoveOrder {
            from: Position::new(from.0, from.1),
            to: Position::new(to.0, to.1),
            purpose,
            priority: 1,
            target: Position::new(target.0, target.1),
        }
    }

    fn open_map(owned: &[(i32, i32)]) -> MapModel {
        let mut map = MapModel::new(4, 4);
        for p in map.positions().collect::<Vec<_>>() {
            map.set_tile(p, Tile::new(TileType::Plain, NEUTRAL, 0));
        }
        for &(x, y) in owned {
            map.set_tile(Position::new(x, y), Tile::new(TileType::Plain, 1, 2));
        }
        map
    }

    #[test]
    fn test_fifo_emission() {
        let map = open_map(&[(0, 0), (1, 0)]);
        let mut q = MoveQueue::default();
        q.push(order((0, 0), (0, 1), Purpose::ExpandLand, (3, 3)));
        q.push(order((1, 0), (1, 1), Purpose::ExpandLand, (3, 3)));
        let first = q.pop_ready(&map, 1).unwrap();
        assert_eq!(first.from, Position::new(0, 0));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_lost_source_discarded() {
        let map = open_map(&[(1, 0)]);
        let mut q = MoveQueue::default();
        q.push(order((0, 0), (0, 1), Purpose::Defend, (3, 3)));
        q.push(order((1, 0), (1, 1), Purpose::Defend, (3, 3)));
        let next = q.pop_ready(&map, 1).unwrap();
        assert_eq!(next.from, Position::new(1, 0));
        assert!(q.is_empty());
    }

    #[test]
    fn test_goal_achieved_drop() {
        // Target (2,2) already owned: ExpandLand order is moot.
        let map = open_map(&[(0, 0), (2, 2)]);
        let mut q = MoveQueue::default();
        q.push(order((0, 0), (0, 1), Purpose::ExpandLand, (2, 2)));
        assert!(q.pop_ready(&map, 1).is_none());

        // Attack and ExpandCity keep flowing even after target capture.
        q.push(order((0, 0), (0, 1), Purpose::Attack, (2, 2)));
        q.push(order((0, 0), (0, 1), Purpose::ExpandCity, (2, 2)));
        assert!(q.pop_ready(&map, 1).is_some());
        assert!(q.pop_ready(&map, 1).is_some());
    }

    #[test]
    fn test_out_of_range_source_discarded() {
        let map = open_map(&[]);
        let mut q = MoveQueue::default();
        q.push(order((9, 9), (9, 8), Purpose::Attack, (0, 0)));
        assert!(q.pop_ready(&map, 1).is_none());
    }
}
