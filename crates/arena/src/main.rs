//! Evaluation matches and position analysis for Gomoku MCTS players.
//!
//! `play` pits a black and a white player against each other, each with its
//! own network and search settings; `analyze` searches a single position and
//! lists the most visited moves.

mod analyze;
mod config;
mod heuristic;
mod match_play;

use alphazero_core::Game;
use alphazero_gomoku::{Board, BoardSpec, Gomoku, GravityGomoku};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{ArenaConfig, NetworkKind, Variant};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

/// AlphaZero-style MCTS arena for Gomoku.
#[derive(Parser)]
#[command(name = "alphazero-arena")]
#[command(about = "Play evaluation matches and analyze positions with parallel MCTS")]
struct Cli {
    /// TOML config file (defaults to $ALPHAZERO_CONFIG if set).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Board settings shared by both subcommands; unset flags keep the config value.
#[derive(clap::Args)]
struct BoardArgs {
    /// Rules to play.
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// Board side length.
    #[arg(long)]
    size: Option<usize>,

    /// Stones in a row needed to win.
    #[arg(long)]
    num_to_win: Option<usize>,

    /// MCTS simulations per move (both players).
    #[arg(short, long)]
    simulations: Option<usize>,

    /// Leaves evaluated per batch (both players).
    #[arg(short = 'k', long)]
    parallel_leaves: Option<usize>,

    /// Random seed for reproducibility.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a match between the black and white players.
    Play {
        #[command(flatten)]
        board: BoardArgs,

        /// Number of games to play.
        #[arg(short, long)]
        games: Option<usize>,

        /// Network used by black.
        #[arg(long, value_enum)]
        black_network: Option<NetworkKind>,

        /// Network used by white.
        #[arg(long, value_enum)]
        white_network: Option<NetworkKind>,

        /// Write a JSON summary of the match to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search one position and print the top moves.
    Analyze {
        #[command(flatten)]
        board: BoardArgs,

        /// Moves leading to the position, e.g. "e4,e5,d4" or "40,49".
        #[arg(short, long, default_value = "")]
        moves: String,

        /// Network used for the search.
        #[arg(long, value_enum)]
        network: Option<NetworkKind>,

        /// Number of candidate moves to show.
        #[arg(long, default_value = "5")]
        top: usize,
    },
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level {:?}", level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

impl BoardArgs {
    fn apply(&self, config: &mut ArenaConfig) {
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(num_to_win) = self.num_to_win {
            config.num_to_win = num_to_win;
        }
        if let Some(simulations) = self.simulations {
            config.set_simulations(simulations);
        }
        if let Some(parallel_leaves) = self.parallel_leaves {
            config.set_parallel_leaves(parallel_leaves);
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
    }
}

/// Run the play command for one variant.
fn cmd_play<G: Game>(game: &G, spec: &BoardSpec, config: &ArenaConfig) -> Result<()> {
    info!(
        "Playing {} games on {:?} {}x{} (win {}): black {:?} {} sims vs white {:?} {} sims",
        config.games,
        config.variant,
        spec.size,
        spec.size,
        spec.num_to_win,
        config.black.network,
        config.black.mcts.num_simulations,
        config.white.network,
        config.white.mcts.num_simulations,
    );

    let summary = match_play::run_match(game, spec, config)?;

    println!("\n================================================");
    println!("MATCH RESULTS ({} games, {:.2}s)", summary.games, summary.elapsed_secs);
    println!("================================================");
    let pct = |n: usize| n as f64 / summary.games.max(1) as f64 * 100.0;
    println!("Black wins: {} ({:.1}%)", summary.black_wins, pct(summary.black_wins));
    println!("White wins: {} ({:.1}%)", summary.white_wins, pct(summary.white_wins));
    println!("Draws:      {} ({:.1}%)", summary.draws, pct(summary.draws));
    println!("------------------------------------------------");
    println!("Black score: {:.1}%", summary.black_score() * 100.0);
    println!("Average game length: {:.1} plies", summary.average_plies);

    if let Some(path) = &config.output {
        let file = File::create(path)
            .with_context(|| format!("Failed to create summary file {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &summary)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        info!("Summary written to {}", path.display());
    }

    Ok(())
}

/// Run the analyze command for one variant.
fn cmd_analyze<G>(
    game: &G,
    spec: &BoardSpec,
    config: &ArenaConfig,
    moves: &str,
    top: usize,
) -> Result<()>
where
    G: Game<State = Board>,
{
    let moves = analyze::parse_moves(moves, spec.size)?;
    let analysis = analyze::analyze_position(game, spec, &config.black, &moves, top, config.seed)?;

    println!("{}", analysis.board);
    println!(
        "Best move: {}   value {:+.3}   ({} simulations, {} dropped, {:.0} ms)",
        analysis.best.as_deref().unwrap_or("-"),
        analysis.root_value,
        analysis.stats.simulations,
        analysis.stats.dropped,
        analysis.stats.elapsed.as_secs_f64() * 1000.0,
    );
    for candidate in &analysis.candidates {
        println!(
            "  {:>4}  visits {:>6}  policy {:.3}",
            candidate.cell, candidate.visits, candidate.policy
        );
    }
    Ok(())
}

/// Build the chosen variant and hand it to `run`.
fn with_variant(
    config: &ArenaConfig,
    run: impl FnOnce(&dyn VariantRunner) -> Result<()>,
) -> Result<()> {
    match config.variant {
        Variant::Freestyle => {
            let game = Gomoku::with_history(config.size, config.num_to_win, config.history)?;
            run(&game)
        }
        Variant::Gravity => {
            let game = GravityGomoku::with_history(config.size, config.num_to_win, config.history)?;
            run(&game)
        }
    }
}

/// Object-safe entry points over the concrete game types.
trait VariantRunner {
    fn play(&self, config: &ArenaConfig) -> Result<()>;
    fn analyze(&self, config: &ArenaConfig, moves: &str, top: usize) -> Result<()>;
}

impl VariantRunner for Gomoku {
    fn play(&self, config: &ArenaConfig) -> Result<()> {
        cmd_play(self, self.spec(), config)
    }

    fn analyze(&self, config: &ArenaConfig, moves: &str, top: usize) -> Result<()> {
        cmd_analyze(self, self.spec(), config, moves, top)
    }
}

impl VariantRunner for GravityGomoku {
    fn play(&self, config: &ArenaConfig) -> Result<()> {
        cmd_play(self, self.spec(), config)
    }

    fn analyze(&self, config: &ArenaConfig, moves: &str, top: usize) -> Result<()> {
        cmd_analyze(self, self.spec(), config, moves, top)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let mut config = ArenaConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Play {
            board,
            games,
            black_network,
            white_network,
            output,
        } => {
            board.apply(&mut config);
            if let Some(games) = games {
                config.games = games;
            }
            if let Some(network) = black_network {
                config.black.network = network;
            }
            if let Some(network) = white_network {
                config.white.network = network;
            }
            if output.is_some() {
                config.output = output;
            }
            with_variant(&config, |runner| runner.play(&config))
        }

        Commands::Analyze {
            board,
            moves,
            network,
            top,
        } => {
            board.apply(&mut config);
            if let Some(network) = network {
                config.black.network = network;
            }
            with_variant(&config, |runner| runner.analyze(&config, &moves, top))
        }
    }
}
