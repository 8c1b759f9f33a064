//! Incremental map updates from the wire
//!
//! Each turn the server sends a diff: a run-length sequence of tokens that
//! covers the grid in flattened order exactly once. A numeric token skips
//! that many unchanged cells; a tile token replaces one cell outright. The
//! number-vs-tile decision is made once, at deserialization, so the apply
//! loop never re-inspects raw values.

use serde::{Deserialize, Serialize};

use crate::map::{GeneralRegistry, MapModel};
use crate::tile::{Color, Tile, TileType, NEUTRAL};

/// One wire token of a map diff
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiffToken {
    /// Leave this many cells unchanged
    Skip(u32),
    /// Replace the next cell
    Tile(Tile),
}

/// Rejected diffs; raised before any cell is touched
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("diff runs past the end of the grid")]
    Overrun,
    #[error("diff covers {covered} of {expected} cells")]
    Short { covered: usize, expected: usize },
}

/// Validate and apply a diff, then refresh the visibility mask and the
/// stronghold registry from the patched grid.
pub fn apply_diff(
    map: &mut MapModel,
    registry: &mut GeneralRegistry,
    my_color: Color,
    tokens: &[DiffToken],
) -> Result<(), DiffError> {
    check_coverage(tokens, map.area())?;

    let mut idx = 0usize;
    for token in tokens {
        match *token {
            DiffToken::Skip(n) => idx += n as usize,
            DiffToken::Tile(t) => {
                map.replace_at(idx, t);
                idx += 1;
            }
        }
    }

    map.refresh_seen();
    scan_strongholds(map, registry, my_color);
    registry.retire_stale(map);
    Ok(())
}

fn check_coverage(tokens: &[DiffToken], expected: usize) -> Result<(), DiffError> {
    let mut covered = 0usize;
    for token in tokens {
        covered += match *token {
            DiffToken::Skip(n) => n as usize,
            DiffToken::Tile(_) => 1,
        };
        if covered > expected {
            return Err(DiffError::Overrun);
        }
    }
    if covered < expected {
        return Err(DiffError::Short { covered, expected });
    }
    Ok(())
}

fn scan_strongholds(map: &MapModel, registry: &mut GeneralRegistry, my_color: Color) {
    for idx in 0..map.area() {
        let t = map.tile_at(idx);
        if t.kind == TileType::King && t.owner != NEUTRAL {
            let pos = map.position(idx);
            if t.owner == my_color {
                registry.record_own(pos);
            } else {
                registry.record_hostile(pos, t.owner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;

    fn plain(owner: Color, army: i32) -> DiffToken {
        DiffToken::Tile(Tile::new(TileType::Plain, owner, army))
    }

    fn king(owner: Color, army: i32) -> DiffToken {
        DiffToken::Tile(Tile::new(TileType::King, owner, army))
    }

    #[test]
    fn test_skip_and_literal_interleave() {
        let mut map = MapModel::new(2, 2);
        let mut reg = GeneralRegistry::default();
        let diff = vec![DiffToken::Skip(1), plain(1, 5), DiffToken::Skip(2)];
        apply_diff(&mut map, &mut reg, 1, &diff).unwrap();

        assert_eq!(map.get(Position::new(0, 0)), Some(Tile::fog()));
        assert_eq!(
            map.get(Position::new(0, 1)),
            Some(Tile::new(TileType::Plain, 1, 5))
        );
        assert_eq!(map.get(Position::new(1, 0)), Some(Tile::fog()));
    }

    #[test]
    fn test_idempotent_reapply() {
        let mut map = MapModel::new(2, 2);
        let mut reg = GeneralRegistry::default();
        let diff = vec![plain(1, 3), DiffToken::Skip(1), plain(2, 7), DiffToken::Skip(1)];
        apply_diff(&mut map, &mut reg, 1, &diff).unwrap();
        let snapshot: Vec<_> = map.positions().map(|p| map.get(p)).collect();
        apply_diff(&mut map, &mut reg, 1, &diff).unwrap();
        let again: Vec<_> = map.positions().map(|p| map.get(p)).collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_coverage_errors() {
        let mut map = MapModel::new(2, 2);
        let mut reg = GeneralRegistry::default();
        let short = vec![DiffToken::Skip(3)];
        match apply_diff(&mut map, &mut reg, 1, &short) {
            Err(DiffError::Short { covered: 3, expected: 4 }) => {}
            other => panic!("expected Short, got {:?}", other),
        }
        let long = vec![DiffToken::Skip(4), plain(1, 1)];
        assert!(matches!(
            apply_diff(&mut map, &mut reg, 1, &long),
            Err(DiffError::Overrun)
        ));
    }

    #[test]
    fn test_stronghold_discovery_and_retirement() {
        let mut map = MapModel::new(3, 1);
        let mut reg = GeneralRegistry::default();
        let diff = vec![king(1, 10), king(2, 10), DiffToken::Skip(1)];
        apply_diff(&mut map, &mut reg, 1, &diff).unwrap();
        assert_eq!(reg.own(), Some(Position::new(0, 0)));
        assert_eq!(reg.hostiles().len(), 1);
        assert_eq!(reg.hostiles()[0].color, 2);

        // Hostile stronghold re-fogs: entry must be dropped.
        let refog = vec![
            DiffToken::Skip(1),
            DiffToken::Tile(Tile::fog()),
            DiffToken::Skip(1),
        ];
        apply_diff(&mut map, &mut reg, 1, &refog).unwrap();
        assert!(reg.hostiles().is_empty());

        // Captured by another color: old entry dropped, new color recorded.
        let capture = vec![DiffToken::Skip(1), king(3, 4), DiffToken::Skip(1)];
        apply_diff(&mut map, &mut reg, 1, &capture).unwrap();
        assert_eq!(reg.hostiles().len(), 1);
        assert_eq!(reg.hostiles()[0].color, 3);
    }

    #[test]
    fn test_wire_parse_decides_tokens() {
        let raw = r#"[2, {"kind": "Plain", "owner": 1, "army": 5}, 1]"#;
        let tokens: Vec<DiffToken> = serde_json::from_str(raw).unwrap();
        assert_eq!(
            tokens,
            vec![
                DiffToken::Skip(2),
                plain(1, 5),
                DiffToken::Skip(1),
            ]
        );
    }
}
