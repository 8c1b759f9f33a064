//! Scenario tests for the decision core
//!
//! Drives a Bot end to end through the wire interface: full-map diffs in,
//! move orders out. Boards are hand-fed turn by turn, so combat outcomes are
//! part of the fixture, not a simulation.

use annex_core::{
    Bot, BotConfig, DiffToken, LeaderboardRow, Position, Purpose, Tile, TileType, NEUTRAL,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn plain(owner: u8, army: i32) -> Tile {
    Tile::new(TileType::Plain, owner, army)
}

fn king(owner: u8, army: i32) -> Tile {
    Tile::new(TileType::King, owner, army)
}

/// Diff that replaces every cell, in flattened order
fn full_diff(tiles: &[Tile]) -> Vec<DiffToken> {
    tiles.iter().map(|&t| DiffToken::Tile(t)).collect()
}

/// 3x3 fully revealed board, our stronghold in the middle with 10 army
fn open_board() -> Vec<Tile> {
    let mut tiles = vec![plain(NEUTRAL, 0); 9];
    tiles[4] = king(1, 10); // (1,1)
    tiles
}

fn bot_on(tiles: &[Tile], width: i32, height: i32) -> Bot {
    let mut bot = Bot::new(BotConfig::with_seed(1, 42));
    bot.init_map(width, height);
    bot.apply_diff(&full_diff(tiles)).unwrap();
    bot
}

// ============================================================================
// EXPANSION OPENING
// ============================================================================

#[test]
fn test_quiet_board_opens_with_expansion() {
    let mut bot = bot_on(&open_board(), 3, 3);

    // The opening is all planning: nothing urgent, expansion gate closed.
    let mut first_move = None;
    for turn in 1..=18 {
        if let Some(mv) = bot.compute_next_move(turn) {
            first_move = Some((turn, mv));
            break;
        }
    }

    let (turn, mv) = first_move.expect("expansion never produced a move");
    assert_eq!(mv.purpose, Purpose::ExpandLand);
    assert_eq!(mv.from, Position::new(1, 1));
    assert_eq!(mv.from.dist(mv.to), 1, "claims start adjacent");
    assert!(turn <= 18, "first claim must come out of the opening");
}

// ============================================================================
// STRONGHOLD DEFENSE
// ============================================================================

#[test]
fn test_defense_precedes_any_expansion() {
    let mut tiles = open_board();
    tiles[3] = plain(2, 3); // (1,0), adjacent to the stronghold
    let mut bot = bot_on(&tiles, 3, 3);

    let mut first_move = None;
    for turn in 1..=40 {
        if let Some(mv) = bot.compute_next_move(turn) {
            first_move = Some(mv);
            break;
        }
    }

    let mv = first_move.expect("defense never produced a move");
    assert_eq!(mv.purpose, Purpose::Defend);
    assert_eq!(mv.priority, 999);
    assert_eq!(mv.from, Position::new(1, 1));
    assert_eq!(mv.to, Position::new(1, 0));
}

// ============================================================================
// STRIKE ON A DISCOVERED STRONGHOLD
// ============================================================================

#[test]
fn test_discovered_stronghold_draws_the_strike() {
    // Hostile stronghold four tiles down an open row.
    let tiles = vec![
        king(1, 30),
        plain(NEUTRAL, 0),
        plain(NEUTRAL, 0),
        plain(NEUTRAL, 0),
        king(2, 5),
    ];
    let mut bot = bot_on(&tiles, 5, 1);

    // First decision after the sighting books both strike tiers and nothing
    // else.
    assert!(bot.compute_next_move(1).is_none());
    let orders: Vec<_> = bot.queue().iter().copied().collect();
    assert!(!orders.is_empty());
    assert!(orders.iter().all(|o| o.purpose == Purpose::AttackGeneral));
    assert!(orders.iter().all(|o| o.target == Position::new(4, 0)));
    let first_full = orders
        .iter()
        .position(|o| o.priority == 100)
        .expect("full-force tier missing");
    assert!(
        orders[..first_full].iter().all(|o| o.priority == 5),
        "pilot tier must be booked before the full-force tier"
    );

    // And the first emitted move is part of the strike.
    let mv = bot.compute_next_move(2).expect("strike never moved");
    assert_eq!(mv.purpose, Purpose::AttackGeneral);
    assert_eq!(mv.from, Position::new(0, 0));
}

#[test]
fn test_stale_probe_yields_to_the_strike() {
    // Fogged far end first: the cadence probe books a push into the fog.
    let tiles = vec![
        king(1, 30),
        plain(NEUTRAL, 0),
        plain(NEUTRAL, 0),
        plain(NEUTRAL, 0),
        Tile::fog(),
    ];
    let mut bot = bot_on(&tiles, 5, 1);
    for turn in 1..=16 {
        assert!(bot.compute_next_move(turn).is_none());
    }
    assert!(!bot.queue().is_empty(), "probe should have booked a push");

    // The fog lifts onto a hostile stronghold.
    let tiles = vec![
        king(1, 30),
        plain(NEUTRAL, 0),
        plain(NEUTRAL, 0),
        plain(NEUTRAL, 0),
        king(2, 5),
    ];
    bot.apply_diff(&full_diff(&tiles)).unwrap();
    // First step of the probe still has a live source and goes out.
    let mv = bot.compute_next_move(17).expect("live head should emit");
    assert_eq!(mv.from, Position::new(0, 0));

    // The server never granted that step, so the rest of the chain waits on
    // sources we do not hold. It drains away and the strike replaces it.
    assert!(bot.compute_next_move(18).is_none());
    let orders: Vec<_> = bot.queue().iter().copied().collect();
    assert!(!orders.is_empty());
    assert!(orders.iter().all(|o| o.purpose == Purpose::AttackGeneral));
}

// ============================================================================
// QUEUE STALENESS
// ============================================================================

#[test]
fn test_orders_die_with_their_source() {
    let mut bot = bot_on(&open_board(), 3, 3);
    for turn in 1..=17 {
        assert!(bot.compute_next_move(turn).is_none());
    }
    assert!(!bot.queue().is_empty());

    // The stronghold falls before the claim is emitted.
    let mut tiles = open_board();
    tiles[4] = king(2, 4); // (1,1) captured
    bot.apply_diff(&full_diff(&tiles)).unwrap();

    assert!(bot.compute_next_move(18).is_none());
    assert!(bot.queue().is_empty(), "stale orders must be discarded");
}

// ============================================================================
// PURSUIT
// ============================================================================

#[test]
fn test_chase_follows_the_captured_frontier() {
    // Row: our stronghold, an outpost, open ground, then enemy land.
    let mut bot = bot_on(
        &[
            king(1, 10),
            plain(1, 1),
            plain(NEUTRAL, 0),
            plain(2, 6),
            plain(2, 1),
        ],
        5,
        1,
    );

    // Turn 1 books the threat response and starts the chase.
    assert!(bot.compute_next_move(1).is_none());

    // March the gathered army onto the threat, feeding combat results back.
    let mv = bot.compute_next_move(2).unwrap();
    assert_eq!((mv.from, mv.to), (Position::new(0, 0), Position::new(1, 0)));
    bot.apply_diff(&full_diff(&[
        king(1, 1),
        plain(1, 10),
        plain(NEUTRAL, 0),
        plain(2, 6),
        plain(2, 1),
    ]))
    .unwrap();

    let mv = bot.compute_next_move(3).unwrap();
    assert_eq!((mv.from, mv.to), (Position::new(1, 0), Position::new(2, 0)));
    bot.apply_diff(&full_diff(&[
        king(1, 1),
        plain(1, 1),
        plain(1, 9),
        plain(2, 6),
        plain(2, 1),
    ]))
    .unwrap();

    let mv = bot.compute_next_move(4).unwrap();
    assert_eq!((mv.from, mv.to), (Position::new(2, 0), Position::new(3, 0)));
    assert_eq!(mv.purpose, Purpose::Defend);
    bot.apply_diff(&full_diff(&[
        king(1, 1),
        plain(1, 1),
        plain(1, 1),
        plain(1, 2),
        plain(2, 1),
    ]))
    .unwrap();

    // Frontier captured: the chase advances into the remaining enemy tile.
    assert!(bot.compute_next_move(5).is_none());
    let mv = bot.compute_next_move(6).expect("chase stalled");
    assert_eq!(mv.purpose, Purpose::Attack);
    assert_eq!(mv.priority, 999);
    assert_eq!((mv.from, mv.to), (Position::new(3, 0), Position::new(4, 0)));
}

// ============================================================================
// REPRODUCIBILITY AND WIRE FORM
// ============================================================================

#[test]
fn test_seeded_bots_replay_identically() {
    let mut tiles = open_board();
    tiles[2] = plain(2, 4); // (0,2)
    let rows = [
        LeaderboardRow { color: 1, army: 15 },
        LeaderboardRow { color: 2, army: 30 },
    ];

    let run = |seed: u64| {
        let mut bot = Bot::new(BotConfig::with_seed(1, seed));
        bot.init_map(3, 3);
        bot.apply_diff(&full_diff(&tiles)).unwrap();
        bot.update_leaderboard(&rows);
        (1..=30)
            .map(|turn| bot.compute_next_move(turn))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(7), run(7));
}

#[test]
fn test_wire_commands_never_split() {
    let mut tiles = open_board();
    tiles[3] = plain(2, 3); // (1,0)
    let mut bot = bot_on(&tiles, 3, 3);

    assert!(bot.compute_next_move(1).is_none());
    let mv = bot.compute_next_move(2).unwrap();
    let cmd = mv.command();
    assert_eq!(cmd.from, mv.from);
    assert_eq!(cmd.to, mv.to);
    assert!(!cmd.half, "this agent never splits its army");

    let json = serde_json::to_value(cmd).unwrap();
    assert_eq!(json["half"], serde_json::Value::Bool(false));
}
