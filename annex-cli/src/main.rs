//! ANNEX CLI - Command-line interface
//!
//! Commands:
//! - simulate: Play self-play matches on generated boards
//! - bench: Measure decision-cycle throughput

use clap::{Parser, Subcommand};

mod bench;
mod engine;
mod sim;

#[derive(Parser)]
#[command(name = "annex")]
#[command(about = "ANNEX territory-game agent toolkit")]
struct Cli {
    /// RNG seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play self-play matches on generated boards
    Simulate(sim::SimArgs),
    /// Measure decision-cycle throughput
    Bench(bench::BenchArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => sim::run(args, cli.seed),
        Commands::Bench(args) => bench::run(args, cli.seed),
    }
}
