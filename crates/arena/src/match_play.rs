//! Evaluation matches between two MCTS players.

use crate::config::{ArenaConfig, NetworkKind, PlayerConfig};
use crate::heuristic::HeuristicNetwork;
use alphazero_core::{Game, Outcome, Player};
use alphazero_gomoku::BoardSpec;
use alphazero_mcts::{worker_pool, Evaluation, Mcts, Network, NetworkError, UniformNetwork};
use anyhow::{bail, Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Networks selectable from the command line or config file.
#[derive(Clone, Debug)]
pub enum ArenaNetwork {
    Uniform(UniformNetwork),
    Heuristic(HeuristicNetwork),
}

impl ArenaNetwork {
    pub fn new(kind: NetworkKind, spec: &BoardSpec) -> Self {
        match kind {
            NetworkKind::Uniform => Self::Uniform(UniformNetwork::new(spec.num_cells())),
            NetworkKind::Heuristic => {
                Self::Heuristic(HeuristicNetwork::new(spec.size, spec.num_to_win, spec.history))
            }
        }
    }
}

impl Network for ArenaNetwork {
    fn evaluate(&self, batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError> {
        match self {
            Self::Uniform(network) => network.evaluate(batch),
            Self::Heuristic(network) => network.evaluate(batch),
        }
    }
}

pub type ArenaPlayer<G> = Mcts<G, ArenaNetwork, ChaCha8Rng>;

/// Build a player from its config. With `pool` the player runs its batches
/// on those shared workers instead of starting its own.
pub fn create_player<G: Game>(
    config: &PlayerConfig,
    spec: &BoardSpec,
    seed: u64,
    pool: Option<&Arc<ThreadPool>>,
) -> Result<ArenaPlayer<G>> {
    let network = ArenaNetwork::new(config.network, spec);
    let rng = ChaCha8Rng::seed_from_u64(seed);
    let player = match pool {
        Some(pool) => Mcts::with_pool(config.mcts.clone(), network, rng, Arc::clone(pool)),
        None => Mcts::new(config.mcts.clone(), network, rng),
    };
    player.context("Failed to create MCTS player")
}

/// One pool for every player of a match, as wide as the widest batch.
/// `None` when both players search sequentially.
fn match_pool(config: &ArenaConfig) -> Result<Option<Arc<ThreadPool>>> {
    let width = config
        .black
        .mcts
        .parallel_leaves
        .max(config.white.mcts.parallel_leaves);
    if width <= 1 {
        return Ok(None);
    }
    let pool = worker_pool(width).context("Failed to start search workers")?;
    debug!(threads = width, "started shared search pool");
    Ok(Some(Arc::new(pool)))
}

/// A finished game.
#[derive(Clone, Debug, Serialize)]
pub struct GameRecord {
    pub seed: u64,
    /// Actions in play order, black first.
    pub moves: Vec<usize>,
    /// `None` for a draw, including games cut off at `max_plies`.
    pub winner: Option<Player>,
    pub simulations: u64,
    pub dropped: u64,
}

/// Results of a whole match.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MatchSummary {
    pub games: usize,
    pub black_wins: usize,
    pub white_wins: usize,
    pub draws: usize,
    pub average_plies: f64,
    pub elapsed_secs: f64,
    pub records: Vec<GameRecord>,
}

impl MatchSummary {
    fn from_records(records: Vec<GameRecord>, elapsed_secs: f64) -> Self {
        let games = records.len();
        let count = |winner: Option<Player>| records.iter().filter(|r| r.winner == winner).count();
        let total_plies: usize = records.iter().map(|r| r.moves.len()).sum();
        Self {
            games,
            black_wins: count(Some(Player::Black)),
            white_wins: count(Some(Player::White)),
            draws: count(None),
            average_plies: if games == 0 {
                0.0
            } else {
                total_plies as f64 / games as f64
            },
            elapsed_secs,
            records,
        }
    }

    /// Black's score: wins plus half the draws, as a fraction of the games.
    pub fn black_score(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        (self.black_wins as f64 + 0.5 * self.draws as f64) / self.games as f64
    }
}

/// Winner of a finished game, from the outcome seen by the last mover.
fn winner<G: Game>(game: &G, state: &G::State) -> Option<Player> {
    let outcome = game.outcome(state)?;
    let for_black = match game.current_player(state).opponent() {
        Player::Black => outcome,
        Player::White => outcome.flip(),
    };
    match for_black {
        Outcome::Win => Some(Player::Black),
        Outcome::Loss => Some(Player::White),
        Outcome::Draw => None,
    }
}

/// Play one game. Both players keep their trees in step with the board,
/// so a player with `reuse_tree` starts each search from its old subtree.
pub fn play_game<G: Game>(
    game: &G,
    black: &mut ArenaPlayer<G>,
    white: &mut ArenaPlayer<G>,
    seed: u64,
    max_plies: usize,
) -> Result<GameRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = game.initial_state();
    let mut moves = Vec::new();
    let mut simulations = 0u64;
    let mut dropped = 0u64;

    while !game.is_terminal(&state) && moves.len() < max_plies {
        let player = match game.current_player(&state) {
            Player::Black => &mut *black,
            Player::White => &mut *white,
        };

        let result = player
            .search(game, &state)
            .with_context(|| format!("Search failed at ply {}", moves.len()))?;
        simulations += u64::from(result.stats.simulations);
        dropped += u64::from(result.stats.dropped);

        let temperature = player.config().effective_temperature(moves.len());
        let Some(action) = result.select_action(temperature, &mut rng) else {
            bail!("No move found at ply {}", moves.len());
        };

        black.advance(game, action)?;
        white.advance(game, action)?;
        state = game.apply(&state, action)?;
        moves.push(action);
    }

    let winner = winner(game, &state);
    debug!(seed, plies = moves.len(), ?winner, "game finished");
    Ok(GameRecord {
        seed,
        moves,
        winner,
        simulations,
        dropped,
    })
}

/// Play `config.games` games between the configured black and white
/// players. Games run in parallel; each uses its own seeds.
pub fn run_match<G: Game>(game: &G, spec: &BoardSpec, config: &ArenaConfig) -> Result<MatchSummary> {
    let start = Instant::now();
    let finished = AtomicUsize::new(0);
    let pool = match_pool(config)?;

    let records = (0..config.games)
        .into_par_iter()
        .map(|i| {
            let game_seed = config.seed.wrapping_add(i as u64 * 1000);
            let mut black = create_player(&config.black, spec, game_seed.wrapping_add(1), pool.as_ref())?;
            let mut white = create_player(&config.white, spec, game_seed.wrapping_add(2), pool.as_ref())?;
            let record = play_game(game, &mut black, &mut white, game_seed, config.max_plies)
                .with_context(|| format!("Game {} failed", i))?;

            let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 10 == 0 || done == config.games {
                info!("Finished {}/{} games", done, config.games);
            }
            Ok(record)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MatchSummary::from_records(records, start.elapsed().as_secs_f64()))
}
