//! Single-position analysis.

use crate::config::PlayerConfig;
use crate::match_play::create_player;
use alphazero_core::Game;
use alphazero_gomoku::BoardSpec;
use alphazero_mcts::SearchStats;
use anyhow::{bail, Context, Result};

/// Parse a comma-separated move list. Each move is either a cell index
/// (`40`) or a column letter followed by a row number (`e4`), using the
/// coordinates printed with the board.
pub fn parse_moves(text: &str, size: usize) -> Result<Vec<usize>> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| parse_move(token, size))
        .collect()
}

fn parse_move(token: &str, size: usize) -> Result<usize> {
    if let Ok(index) = token.parse::<usize>() {
        return Ok(index);
    }

    let mut chars = token.chars();
    let Some(letter) = chars.next().filter(char::is_ascii_lowercase) else {
        bail!("Invalid move {:?}: expected an index or a coordinate like e4", token);
    };
    let col = (letter as u8 - b'a') as usize;
    let row: usize = chars
        .as_str()
        .parse()
        .with_context(|| format!("Invalid row in move {:?}", token))?;
    if row >= size || col >= size {
        bail!("Move {:?} is off the {}x{} board", token, size, size);
    }
    Ok(row * size + col)
}

/// Coordinate name of a cell, the inverse of `parse_moves`.
pub fn cell_name(action: usize, size: usize) -> String {
    let (row, col) = (action / size, action % size);
    format!("{}{}", (b'a' + col as u8) as char, row)
}

/// One candidate move at the root.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub action: usize,
    pub cell: String,
    pub visits: u32,
    pub policy: f32,
}

#[derive(Clone, Debug)]
pub struct Analysis {
    pub best: Option<String>,
    pub root_value: f32,
    pub candidates: Vec<Candidate>,
    pub stats: SearchStats,
    /// Board after the given moves, for display.
    pub board: String,
}

/// Play `moves` from the initial position and search the result, keeping
/// the `top` most visited moves.
pub fn analyze_position<G>(
    game: &G,
    spec: &BoardSpec,
    config: &PlayerConfig,
    moves: &[usize],
    top: usize,
    seed: u64,
) -> Result<Analysis>
where
    G: Game,
    G::State: std::fmt::Display,
{
    let mut state = game.initial_state();
    for (ply, &action) in moves.iter().enumerate() {
        state = game
            .apply(&state, action)
            .with_context(|| format!("Move {} ({}) cannot be played", ply + 1, cell_name(action, spec.size)))?;
    }

    let mut player = create_player::<G>(config, spec, seed, None)?;
    let result = player.search(game, &state).context("Search failed")?;

    let mut candidates: Vec<Candidate> = result
        .visit_counts
        .iter()
        .map(|&(action, visits)| Candidate {
            action,
            cell: cell_name(action, spec.size),
            visits,
            policy: result.policy[action],
        })
        .collect();
    // Stable sort keeps ascending actions among equal counts
    candidates.sort_by(|a, b| b.visits.cmp(&a.visits));
    candidates.truncate(top);

    Ok(Analysis {
        best: result.best_action().map(|a| cell_name(a, spec.size)),
        root_value: result.root_value,
        candidates,
        stats: result.stats,
        board: state.to_string(),
    })
}
