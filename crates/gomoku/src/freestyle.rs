//! Free-style Gomoku: any empty cell may be played.

use crate::board::{Board, BoardSpec};
use crate::observation;
use alphazero_core::{Game, Outcome, Player, Result};

/// Free-style Gomoku on a square board.
#[derive(Clone, Debug)]
pub struct Gomoku {
    spec: BoardSpec,
}

impl Gomoku {
    pub const DEFAULT_SIZE: usize = 15;
    pub const DEFAULT_NUM_TO_WIN: usize = 5;
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

    /// 15x15, five in a row.
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
}

impl Game for Gomoku {
    type State = Board;

    fn initial_state(&self) -> Board {
        Board::empty(self.spec.size)
    }

    fn legal_actions(&self, state: &Board) -> Vec<usize> {
        if state.is_finished() {
            return Vec::new();
        }
        (0..self.spec.num_cells())
            .filter(|&a| state.stone_at(a).is_none())
            .collect()
    }

    fn apply(&self, state: &Board, action: usize) -> Result<Board> {
        self.spec.check_move(state, action)?;
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
