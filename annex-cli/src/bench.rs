//! Bench command - measure decision-cycle throughput
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: run_cycle_benchmark(), run_view_benchmark(), report_results()
//! - Level 3: benchmark_decision_cycles(), benchmark_view_encoding()
//! - Level 4: timing utilities, formatting

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Args;

use annex_core::{Bot, BotConfig, Color, MoveCommand};

use crate::engine::{Engine, EngineConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchArgs {
    /// Number of turns to time
    #[arg(long, default_value = "500")]
    pub turns: usize,

    /// Number of players per board
    #[arg(long, default_value = "2")]
    pub players: u8,

    /// Board scale; the side grows linearly with it
    #[arg(long, default_value = "1")]
    pub scale: i32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

impl BenchArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            players: self.players,
            scale: self.scale,
            ..EngineConfig::default()
        }
    }
}

/// Results of a single benchmark run
#[derive(Clone, Debug)]
struct BenchmarkResult {
    name: String,
    turns: usize,
    total_time: Duration,
    avg_time_per_turn: Duration,
    turns_per_second: f64,
    notes: String,
}

/// All benchmark results
#[derive(Clone, Debug)]
struct AllResults {
    results: Vec<BenchmarkResult>,
    system_info: String,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run bench command
///
/// This function reads like a table of contents:
/// 1. Time full decision cycles (views, decisions, resolution)
/// 2. Time view encoding alone (growth and diffs, no decisions)
/// 3. Report all results
pub fn run(args: BenchArgs, seed: Option<u64>) -> Result<()> {
    tracing::info!(
        "Starting benchmarks: {} turns, {} players, scale {}",
        args.turns,
        args.players,
        args.scale
    );

    let mut all_results = AllResults {
        results: Vec::new(),
        system_info: get_system_info(),
    };

    run_cycle_benchmark(&args, seed, &mut all_results)?;
    run_view_benchmark(&args, seed, &mut all_results)?;

    report_results(&all_results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Time full decision cycles
fn run_cycle_benchmark(args: &BenchArgs, seed: Option<u64>, results: &mut AllResults) -> Result<()> {
    tracing::info!("Benchmarking decision cycles...");
    let result = benchmark_decision_cycles(args, seed.unwrap_or(42))?;
    results.results.push(result);
    Ok(())
}

/// Time view encoding alone
fn run_view_benchmark(args: &BenchArgs, seed: Option<u64>, results: &mut AllResults) -> Result<()> {
    tracing::info!("Benchmarking view encoding...");
    let result = benchmark_view_encoding(args, seed.unwrap_or(42))?;
    results.results.push(result);
    Ok(())
}

/// Report all benchmark results
fn report_results(results: &AllResults, args: &BenchArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Time the full per-turn loop: growth, views, leaderboard, decisions and
/// command resolution. A decided match restarts on a fresh board so every
/// timed turn does real work.
fn benchmark_decision_cycles(args: &BenchArgs, base_seed: u64) -> Result<BenchmarkResult> {
    let config = args.engine_config();
    let (mut engine, mut bots) = fresh_match(config, base_seed)?;
    let mut matches = 1u64;

    let start = Instant::now();
    let mut total_moves = 0usize;
    let mut turn = 0u32;

    for _ in 0..args.turns {
        turn += 1;
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
        total_moves += commands.len();
        for (color, cmd) in &commands {
            engine.apply_command(*color, cmd);
        }

        if engine.winner().is_some() {
            let (e, b) = fresh_match(config, base_seed.wrapping_add(matches))?;
            engine = e;
            bots = b;
            matches += 1;
            turn = 0;
        }
    }

    let total_time = start.elapsed();
    let avg_time = total_time / args.turns as u32;

    Ok(BenchmarkResult {
        name: "Decision cycle".to_string(),
        turns: args.turns,
        total_time,
        avg_time_per_turn: avg_time,
        turns_per_second: args.turns as f64 / total_time.as_secs_f64(),
        notes: format!(
            "Avg moves/turn: {:.2}, matches: {}",
            total_moves as f64 / args.turns as f64,
            matches
        ),
    })
}

/// Time growth plus view diffs with no decisions, isolating the wire layer
fn benchmark_view_encoding(args: &BenchArgs, base_seed: u64) -> Result<BenchmarkResult> {
    let config = args.engine_config();
    let (mut engine, mut bots) = fresh_match(config, base_seed)?;

    let start = Instant::now();
    let mut total_tokens = 0usize;

    for _ in 0..args.turns {
        engine.begin_turn();
        for bot in &mut bots {
            let diff = engine.view_diff(bot.color());
            total_tokens += diff.len();
            bot.apply_diff(&diff)?;
        }
    }

    let total_time = start.elapsed();
    let avg_time = total_time / args.turns as u32;
    let views = args.turns * bots.len();

    Ok(BenchmarkResult {
        name: "View encoding".to_string(),
        turns: args.turns,
        total_time,
        avg_time_per_turn: avg_time,
        turns_per_second: args.turns as f64 / total_time.as_secs_f64(),
        notes: format!("Avg tokens/view: {:.1}", total_tokens as f64 / views as f64),
    })
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Generate a board and seat one agent per color on it
fn fresh_match(config: EngineConfig, seed: u64) -> Result<(Engine, Vec<Bot>)> {
    let engine = Engine::generate(config, seed)?;
    let mut bots: Vec<Bot> = (1..=config.players)
        .map(|color| Bot::new(BotConfig::with_seed(color, seed.wrapping_add(color as u64))))
        .collect();
    for bot in &mut bots {
        bot.init_map(engine.width(), engine.height());
    }
    Ok((engine, bots))
}

/// Get system information string
fn get_system_info() -> String {
    format!(
        "Rust {}, {} CPUs",
        env!("CARGO_PKG_VERSION"),
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1)
    )
}

/// Format duration for display
fn format_duration(d: Duration) -> String {
    if d.as_secs() >= 60 {
        format!("{}m {:.1}s", d.as_secs() / 60, (d.as_secs() % 60) as f64 + d.subsec_millis() as f64 / 1000.0)
    } else if d.as_secs() >= 1 {
        format!("{:.2}s", d.as_secs_f64())
    } else if d.as_millis() >= 1 {
        format!("{:.1}ms", d.as_secs_f64() * 1000.0)
    } else {
        format!("{:.1}us", d.as_secs_f64() * 1_000_000.0)
    }
}

/// Print results as JSON
fn print_json_results(results: &AllResults) {
    #[derive(serde::Serialize)]
    struct JsonBenchmark {
        name: String,
        turns: usize,
        total_time_ms: u64,
        avg_time_ms: f64,
        turns_per_second: f64,
        notes: String,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        system_info: String,
        benchmarks: Vec<JsonBenchmark>,
    }

    let output = JsonOutput {
        system_info: results.system_info.clone(),
        benchmarks: results
            .results
            .iter()
            .map(|r| JsonBenchmark {
                name: r.name.clone(),
                turns: r.turns,
                total_time_ms: r.total_time.as_millis() as u64,
                avg_time_ms: r.avg_time_per_turn.as_secs_f64() * 1000.0,
                turns_per_second: r.turns_per_second,
                notes: r.notes.clone(),
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text table
fn print_text_results(results: &AllResults) {
    println!("\n=== ANNEX Benchmark Results ===");
    println!("System: {}\n", results.system_info);

    println!(
        "{:<16} {:>8} {:>12} {:>12} {:>10}  {}",
        "Benchmark", "Turns", "Total Time", "Avg/Turn", "Turns/s", "Notes"
    );
    println!("{}", "-".repeat(86));

    for r in &results.results {
        println!(
            "{:<16} {:>8} {:>12} {:>12} {:>10.1}  {}",
            r.name,
            r.turns,
            format_duration(r.total_time),
            format_duration(r.avg_time_per_turn),
            r.turns_per_second,
            r.notes
        );
    }

    // Print the cost of deciding relative to the wire layer alone
    let cycle = results.results.iter().find(|r| r.name == "Decision cycle");
    let view = results.results.iter().find(|r| r.name == "View encoding");

    if let (Some(cycle), Some(view)) = (cycle, view) {
        if cycle.turns_per_second > 0.0 && view.turns_per_second > 0.0 {
            let overhead = view.turns_per_second / cycle.turns_per_second;
            println!("\nDecision cycle cost vs view encoding: {:.1}x", overhead);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert!(format_duration(Duration::from_millis(500)).contains("ms"));
        assert!(format_duration(Duration::from_secs(5)).contains("s"));
        assert!(format_duration(Duration::from_secs(90)).contains("m"));
    }

    #[test]
    fn test_get_system_info() {
        let info = get_system_info();
        assert!(info.contains("Rust"));
        assert!(info.contains("CPUs"));
    }

    #[test]
    fn test_short_cycle_benchmark() {
        let args = BenchArgs {
            turns: 30,
            players: 2,
            scale: 1,
            json: false,
        };
        let result = benchmark_decision_cycles(&args, 11).unwrap();
        assert_eq!(result.turns, 30);
        assert!(result.turns_per_second > 0.0);
    }
}
