//! Command-line driver: play a single logged game, or batch many seeds

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use everdell_engine::core::PlayerId;
use everdell_engine::game::{
    new_game, GameEndReason, GameLoop, PlayerController, RandomController, VerbosityLevel,
};
use rayon::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "everdell", about = "Worker-placement rules engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Verbosity {
    Silent,
    Minimal,
    Normal,
    Verbose,
}

impl From<Verbosity> for VerbosityLevel {
    fn from(v: Verbosity) -> Self {
        match v {
            Verbosity::Silent => VerbosityLevel::Silent,
            Verbosity::Minimal => VerbosityLevel::Minimal,
            Verbosity::Normal => VerbosityLevel::Normal,
            Verbosity::Verbose => VerbosityLevel::Verbose,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Play one random-vs-random game
    Play {
        /// Number of players (2-4)
        #[arg(long, default_value_t = 2)]
        players: usize,

        /// Game seed
        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long, value_enum, default_value_t = Verbosity::Normal)]
        verbosity: Verbosity,

        /// Stop after this many applied actions
        #[arg(long, default_value_t = 5000)]
        max_actions: u32,

        /// Write the final state as JSON to this file
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Play many seeds in parallel and summarize
    Batch {
        #[arg(long, default_value_t = 2)]
        players: usize,

        /// Number of games; seeds run from --seed upward
        #[arg(long, default_value_t = 100)]
        games: u64,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long, default_value_t = 5000)]
        max_actions: u32,
    },
}

fn controllers(players: usize, seed: u64) -> Vec<Box<dyn PlayerController>> {
    (0..players)
        .map(|i| {
            Box::new(RandomController::new(
                PlayerId::new(i as u8),
                seed.wrapping_add(1 + i as u64),
            )) as Box<dyn PlayerController>
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Play {
            players,
            seed,
            verbosity,
            max_actions,
            dump,
        } => {
            let mut game = new_game(players, seed).context("setting up the game")?;
            game.logger.set_verbosity(verbosity.into());
            let mut game_loop =
                GameLoop::new(game, controllers(players, seed))?.with_max_actions(max_actions);
            let result = game_loop.run().context("running the game")?;

            println!();
            for score in &result.scores {
                let parts: Vec<String> = score
                    .breakdown()
                    .iter()
                    .map(|(name, value)| format!("{name} {value}"))
                    .collect();
                println!(
                    "{}: {} ({})",
                    score.player,
                    score.total,
                    parts.join(", ")
                );
            }
            println!(
                "winner: {} after {} actions{}",
                result.winner,
                result.actions_taken,
                if result.end_reason == GameEndReason::ActionLimit {
                    " (action limit)"
                } else {
                    ""
                }
            );

            if let Some(path) = dump {
                let json = serde_json::to_string_pretty(game_loop.game())
                    .context("serializing the final state")?;
                std::fs::write(&path, json)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("state written to {}", path.display());
            }
            Ok(())
        }
        Command::Batch {
            players,
            games,
            seed,
            max_actions,
        } => {
            let results: Vec<_> = (0..games)
                .into_par_iter()
                .map(|i| {
                    let game_seed = seed.wrapping_add(i);
                    let mut game = new_game(players, game_seed)?;
                    game.logger.set_verbosity(VerbosityLevel::Silent);
                    let mut game_loop = GameLoop::new(game, controllers(players, game_seed))?
                        .with_max_actions(max_actions);
                    game_loop.run()
                })
                .collect::<Result<_, _>>()
                .context("running the batch")?;

            let mut wins = vec![0u64; players];
            let mut total_actions = 0u64;
            let mut finished = 0u64;
            for result in &results {
                wins[result.winner.index()] += 1;
                total_actions += result.actions_taken as u64;
                if result.end_reason == GameEndReason::Finished {
                    finished += 1;
                }
            }
            println!("{games} games, {players} players");
            for (seat, count) in wins.iter().enumerate() {
                println!("P{seat}: {count} wins");
            }
            println!(
                "finished {finished}/{games}, avg {} actions",
                total_actions / games.max(1)
            );
            Ok(())
        }
    }
}
