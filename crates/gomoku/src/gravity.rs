//! Gravity Gomoku: stones drop to the lowest empty cell of a column.
//!
//! Only the lowest empty cell of each column is playable, so at most
//! `size` actions are legal at any time. Filling a cell makes the one
//! above it playable.

use crate::board::{Board, BoardSpec};
use crate::observation;
use alphazero_core::{AlphaZeroError, Game, Outcome, Player, Result};

/// Gomoku with column gravity, four in a row by default.
#[derive(Clone, Debug)]
pub struct GravityGomoku {
    spec: BoardSpec,
}

impl GravityGomoku {
    pub const DEFAULT_SIZE: usize = 15;
    pub const DEFAULT_NUM_TO_WIN: usize = 4;
    pub const DEFAULT_HISTORY: usize = 8;

    /// # Errors
    /// `InvalidConfig` for impossible dimensions.
    pub fn new(size: usize, num_to_win: usize) -> Result<Self> {
        Self::with_history(size, num_to_win, Self::DEFAULT_HISTORY)
    }

    /// # Errors
    /// `InvalidConfig` for impossible dimensions.
    pub fn with_history(size: usize, num_to_win: usize, history: usize) -> Result<Self> {
        Ok(Self {
            spec: BoardSpec::new(size, num_to_win, history)?,
        })
    }

    /// 15x15, four in a row.
    pub fn standard() -> Self {
        Self {
            spec: BoardSpec {
                size: Self::DEFAULT_SIZE,
                num_to_win: Self::DEFAULT_NUM_TO_WIN,
                history: Self::DEFAULT_HISTORY,
            },
        }
    }

    pub fn spec(&self) -> &BoardSpec {
        &self.spec
    }

    /// True if `action` is empty and rests on the ground or on a stone.
    fn is_supported(&self, state: &Board, action: usize) -> bool {
        let size = self.spec.size;
        state.stone_at(action).is_none()
            && (action < size || state.stone_at(action - size).is_some())
    }
}

impl Game for GravityGomoku {
    type State = Board;

    fn initial_state(&self) -> Board {
        Board::empty(self.spec.size)
    }

    fn legal_actions(&self, state: &Board) -> Vec<usize> {
        if state.is_finished() {
            return Vec::new();
        }
        let size = self.spec.size;
        let mut actions: Vec<usize> = (0..size)
            .filter_map(|col| {
                (0..size)
                    .map(|row| row * size + col)
                    .find(|&a| state.stone_at(a).is_none())
            })
            .collect();
        actions.sort_unstable();
        actions
    }

    fn apply(&self, state: &Board, action: usize) -> Result<Board> {
        self.spec.check_move(state, action)?;
        if !self.is_supported(state, action) {
            return Err(AlphaZeroError::IllegalAction {
                action,
                reason: "cell below is empty",
            });
        }
        Ok(self.spec.place(state, action))
    }

    fn is_terminal(&self, state: &Board) -> bool {
        state.is_finished()
    }

    fn outcome(&self, state: &Board) -> Option<Outcome> {
        self.spec.outcome(state)
    }

    fn current_player(&self, state: &Board) -> Player {
        state.to_play()
    }

    fn encode(&self, state: &Board) -> Vec<f32> {
        observation::encode(state, self.spec.history)
    }

    fn observation_shape(&self) -> [usize; 3] {
        [
            observation::num_planes(self.spec.history),
            self.spec.size,
            self.spec.size,
        ]
    }

    fn num_actions(&self) -> usize {
        self.spec.num_cells()
    }
}
