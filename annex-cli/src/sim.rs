//! Simulate command - self-play matches on generated boards
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_series(), report_results()
//! - Level 3: play_single_match(), compute_series_statistics()
//! - Level 4: formatting utilities

use anyhow::Result;
use clap::Args;

use annex_core::{Bot, BotConfig, Color, MoveCommand};

use crate::engine::{Engine, EngineConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SimArgs {
    /// Number of matches to play
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Number of players per match
    #[arg(long, default_value = "2")]
    pub players: u8,

    /// Board scale; the side grows linearly with it
    #[arg(long, default_value = "1")]
    pub scale: i32,

    /// Relative weight of mountains among obstacles
    #[arg(long, default_value = "0.5")]
    pub mountain: f64,

    /// Relative weight of cities among obstacles
    #[arg(long, default_value = "0.5")]
    pub city: f64,

    /// Turn cap per match; an undecided match counts as a draw
    #[arg(long, default_value = "2000")]
    pub max_turns: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

impl SimArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            players: self.players,
            scale: self.scale,
            mountain: self.mountain,
            city: self.city,
        }
    }
}

/// Result of a single match
#[derive(Clone, Debug)]
struct MatchRecord {
    game_number: usize,
    winner: Option<Color>,
    turns: u32,
}

/// Aggregated series results
#[derive(Clone, Debug)]
struct SeriesResults {
    matches: Vec<MatchRecord>,
    /// Win count per color, in color order 1..=players
    wins: Vec<usize>,
    draws: usize,
    avg_turns: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run simulate command
///
/// This function reads like a table of contents:
/// 1. Play the series (multiple matches)
/// 2. Report results
pub fn run(args: SimArgs, seed: Option<u64>) -> Result<()> {
    tracing::info!(
        "Starting series: {} matches, {} players, scale {}",
        args.games,
        args.players,
        args.scale
    );

    let results = play_series(&args, seed)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play all matches in the series
fn play_series(args: &SimArgs, seed: Option<u64>) -> Result<SeriesResults> {
    let base_seed = seed.unwrap_or(42);
    let mut matches = Vec::with_capacity(args.games);

    for game_num in 0..args.games {
        let match_seed = base_seed.wrapping_add(game_num as u64);
        let record = play_single_match(args, game_num + 1, match_seed)?;

        tracing::info!(
            "Match {}: {} in {} turns",
            record.game_number,
            describe_winner(record.winner),
            record.turns
        );

        matches.push(record);
    }

    Ok(compute_series_statistics(matches, args.players))
}

/// Report series results
fn report_results(results: &SeriesResults, args: &SimArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one match to elimination or the turn cap.
///
/// Per turn: armies grow, every surviving agent gets its view diff and the
/// leaderboard, each decides at most one move, and the moves resolve in color
/// order.
fn play_single_match(args: &SimArgs, game_number: usize, seed: u64) -> Result<MatchRecord> {
    let mut engine = Engine::generate(args.engine_config(), seed)?;
    let mut bots: Vec<Bot> = (1..=args.players)
        .map(|color| Bot::new(BotConfig::with_seed(color, seed.wrapping_add(color as u64))))
        .collect();
    for bot in &mut bots {
        bot.init_map(engine.width(), engine.height());
    }

    for turn in 1..=args.max_turns {
        engine.begin_turn();
        let rows = engine.leaderboard();

        let mut commands: Vec<(Color, MoveCommand)> = Vec::new();
        for bot in &mut bots {
            if !engine.is_alive(bot.color()) {
                continue;
            }
            let diff = engine.view_diff(bot.color());
            bot.apply_diff(&diff)?;
            bot.update_leaderboard(&rows);
            if let Some(order) = bot.compute_next_move(turn) {
                commands.push((bot.color(), order.command()));
            }
        }
        for (color, cmd) in &commands {
            engine.apply_command(*color, cmd);
        }

        if engine.winner().is_some() {
            break;
        }
    }

    Ok(MatchRecord {
        game_number,
        winner: engine.winner(),
        turns: engine.turn(),
    })
}

/// Compute aggregate statistics from match records
fn compute_series_statistics(matches: Vec<MatchRecord>, players: u8) -> SeriesResults {
    let mut wins = vec![0usize; players as usize];
    let mut draws = 0;
    for record in &matches {
        match record.winner {
            Some(color) if (1..=players).contains(&color) => wins[color as usize - 1] += 1,
            _ => draws += 1,
        }
    }

    let total_turns: u32 = matches.iter().map(|r| r.turns).sum();
    let avg_turns = if matches.is_empty() {
        0.0
    } else {
        total_turns as f32 / matches.len() as f32
    };

    SeriesResults {
        matches,
        wins,
        draws,
        avg_turns,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn describe_winner(winner: Option<Color>) -> String {
    match winner {
        Some(color) => format!("color {} wins", color),
        None => "draw".to_string(),
    }
}

/// Print results as JSON
fn print_json_results(results: &SeriesResults) {
    #[derive(serde::Serialize)]
    struct JsonMatch {
        game_number: usize,
        winner: Option<Color>,
        turns: u32,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_matches: usize,
        wins: Vec<usize>,
        draws: usize,
        avg_turns: f32,
        matches: Vec<JsonMatch>,
    }

    let output = JsonOutput {
        total_matches: results.matches.len(),
        wins: results.wins.clone(),
        draws: results.draws,
        avg_turns: results.avg_turns,
        matches: results
            .matches
            .iter()
            .map(|r| JsonMatch {
                game_number: r.game_number,
                winner: r.winner,
                turns: r.turns,
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &SeriesResults) {
    let total = results.matches.len();

    println!("\n=== Series Results ===");
    println!("Total matches: {}", total);
    for (i, &wins) in results.wins.iter().enumerate() {
        println!(
            "Color {} wins: {} ({:.1}%)",
            i + 1,
            wins,
            percent(wins, total)
        );
    }
    println!(
        "Draws:         {} ({:.1}%)",
        results.draws,
        percent(results.draws, total)
    );
    println!("Avg turns:     {:.1}", results.avg_turns);

    println!("\nMatch details:");
    for record in &results.matches {
        println!(
            "  Match {}: {} in {} turns",
            record.game_number,
            describe_winner(record.winner),
            record.turns
        );
    }
}

fn percent(part: usize, total: usize) -> f32 {
    if total > 0 {
        part as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
