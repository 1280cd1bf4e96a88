//! Board state shared by the Gomoku variants.
//!
//! Cells are stored row-major with action id `row * size + col`. Row 0 is
//! the ground row, which only matters for the gravity variant.

use alphazero_core::{AlphaZeroError, Outcome, Player, Result};
use std::fmt;

/// Largest supported board edge.
pub const MAX_BOARD_SIZE: usize = 25;

/// The four line directions checked for a win: horizontal, vertical and
/// both diagonals, as (row, col) steps.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Dimensions and win length of a Gomoku board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardSpec {
    pub size: usize,
    pub num_to_win: usize,
    pub history: usize,
}

impl BoardSpec {
    /// Validated board dimensions.
    ///
    /// # Errors
    /// `InvalidConfig` when the board is empty or larger than
    /// [`MAX_BOARD_SIZE`], when `num_to_win` does not fit on the board, or
    /// when `history` is zero.
    pub fn new(size: usize, num_to_win: usize, history: usize) -> Result<Self> {
        if size == 0 || size > MAX_BOARD_SIZE {
            return Err(AlphaZeroError::InvalidConfig(format!(
                "board size {} outside 1..={}",
                size, MAX_BOARD_SIZE
            )));
        }
        if num_to_win == 0 || num_to_win > size {
            return Err(AlphaZeroError::InvalidConfig(format!(
                "num_to_win {} does not fit a {}x{} board",
                num_to_win, size, size
            )));
        }
        if history == 0 {
            return Err(AlphaZeroError::InvalidConfig(
                "history must keep at least the current position".to_string(),
            ));
        }
        Ok(Self {
            size,
            num_to_win,
            history,
        })
    }

    pub fn num_cells(&self) -> usize {
        self.size * self.size
    }

    /// Rejects moves that no variant could accept: out of range, after the
    /// game ended, or onto an occupied cell.
    pub(crate) fn check_move(&self, board: &Board, action: usize) -> Result<()> {
        if action >= self.num_cells() {
            return Err(AlphaZeroError::ActionOutOfBounds {
                action,
                num_actions: self.num_cells(),
            });
        }
        if board.is_finished() {
            return Err(AlphaZeroError::GameOver);
        }
        if board.cells[action].is_some() {
            return Err(AlphaZeroError::IllegalAction {
                action,
                reason: "cell is occupied",
            });
        }
        Ok(())
    }

    /// Places a stone for the side to move. The caller has checked legality.
    pub(crate) fn place(&self, board: &Board, action: usize) -> Board {
        let mut next = board.clone();
        let player = board.to_play;
        next.cells[action] = Some(player);
        next.moves.push(action);
        next.to_play = player.opponent();
        if next.connects(action, player, self.num_to_win) {
            next.winner = Some(player);
        }
        next
    }

    pub(crate) fn outcome(&self, board: &Board) -> Option<Outcome> {
        if board.winner.is_some() {
            // Only the player who just moved can have completed a line
            Some(Outcome::Win)
        } else if board.is_full() {
            Some(Outcome::Draw)
        } else {
            None
        }
    }
}

/// A Gomoku position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Player>>,
    to_play: Player,
    moves: Vec<usize>,
    winner: Option<Player>,
}

impl Board {
    /// An empty board with black to move.
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
            to_play: Player::Black,
            moves: Vec::new(),
            winner: None,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Stone at `(row, col)`, `None` when empty or off the board.
    pub fn stone(&self, row: usize, col: usize) -> Option<Player> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells[row * self.size + col]
    }

    /// Stone at a flat action index.
    pub fn stone_at(&self, action: usize) -> Option<Player> {
        self.cells.get(action).copied().flatten()
    }

    pub fn to_play(&self) -> Player {
        self.to_play
    }

    /// Actions played so far, oldest first.
    pub fn moves(&self) -> &[usize] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<usize> {
        self.moves.last().copied()
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn is_full(&self) -> bool {
        self.moves.len() == self.cells.len()
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some() || self.is_full()
    }

    pub(crate) fn cells(&self) -> &[Option<Player>] {
        &self.cells
    }

    /// True if the line through `action` holds at least `num_to_win`
    /// consecutive stones of `player`.
    fn connects(&self, action: usize, player: Player, num_to_win: usize) -> bool {
        let row = (action / self.size) as isize;
        let col = (action % self.size) as isize;

        DIRECTIONS.iter().any(|&(dr, dc)| {
            let run = 1
                + self.run_length(row, col, dr, dc, player)
                + self.run_length(row, col, -dr, -dc, player);
            run >= num_to_win
        })
    }

    fn run_length(&self, row: isize, col: isize, dr: isize, dc: isize, player: Player) -> usize {
        let n = self.size as isize;
        let (mut r, mut c) = (row + dr, col + dc);
        let mut count = 0;
        while (0..n).contains(&r) && (0..n).contains(&c) {
            if self.cells[(r * n + c) as usize] != Some(player) {
                break;
            }
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }
}

impl fmt::Display for Board {
    /// Top row first so the ground row sits at the bottom.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.size).rev() {
            write!(f, "{:>2} ", row)?;
            for col in 0..self.size {
                let symbol = match self.stone(row, col) {
                    Some(Player::Black) => 'X',
                    Some(Player::White) => 'O',
                    None => '.',
                };
                write!(f, " {}", symbol)?;
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for col in 0..self.size {
            write!(f, " {}", (b'a' + col as u8) as char)?;
        }
        writeln!(f)
    }
}
