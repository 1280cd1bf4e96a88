//! Pattern-based baseline network.
//!
//! Reads the two current-position planes of a Gomoku observation and scores
//! every empty cell by the lines it would extend or block. Plays a sensible
//! opening and never ignores a win or an open threat, which makes it a
//! useful opponent for checking that search adds strength.

use alphazero_gomoku::observation;
use alphazero_mcts::{Evaluation, Network, NetworkError};

/// Row/column steps of the four line directions.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Blocking an opponent line is worth slightly less than extending ours.
const BLOCK_WEIGHT: f32 = 0.8;

/// Score for a cell that completes a line.
const WINNING_SCORE: f32 = 1.0e4;

#[derive(Clone, Debug)]
pub struct HeuristicNetwork {
    size: usize,
    num_to_win: usize,
    history: usize,
}

impl HeuristicNetwork {
    pub fn new(size: usize, num_to_win: usize, history: usize) -> Self {
        Self {
            size,
            num_to_win,
            history,
        }
    }

    fn area(&self) -> usize {
        self.size * self.size
    }

    /// Length of the line through empty `cell` if `stones` placed there.
    fn line_through(&self, stones: &[f32], cell: usize, (dr, dc): (isize, isize)) -> usize {
        let count = |sign: isize| {
            let mut n = 0;
            let mut r = (cell / self.size) as isize + sign * dr;
            let mut c = (cell % self.size) as isize + sign * dc;
            while (0..self.size as isize).contains(&r)
                && (0..self.size as isize).contains(&c)
                && stones[r as usize * self.size + c as usize] > 0.5
            {
                n += 1;
                r += sign * dr;
                c += sign * dc;
            }
            n
        };
        1 + count(1) + count(-1)
    }

    fn line_score(&self, len: usize) -> f32 {
        if len >= self.num_to_win {
            WINNING_SCORE
        } else {
            4f32.powi(len as i32 - 1)
        }
    }

    fn evaluate_one(&self, obs: &[f32]) -> Result<Evaluation, NetworkError> {
        let area = self.area();
        let expected = observation::num_planes(self.history) * area;
        if obs.len() != expected {
            return Err(NetworkError::Failed(format!(
                "observation has {} values, expected {}",
                obs.len(),
                expected
            )));
        }
        let own = &obs[..area];
        let theirs = &obs[area..2 * area];

        let center = (self.size as f32 - 1.0) / 2.0;
        let mut scores = vec![0.0f32; area];
        let mut own_best = 0;
        let mut their_best = 0;

        for cell in 0..area {
            if own[cell] > 0.5 || theirs[cell] > 0.5 {
                continue;
            }
            let mut score = 0.0;
            for dir in DIRECTIONS {
                let mine = self.line_through(own, cell, dir);
                let blocked = self.line_through(theirs, cell, dir);
                own_best = own_best.max(mine);
                their_best = their_best.max(blocked);
                score += self.line_score(mine) + BLOCK_WEIGHT * self.line_score(blocked);
            }
            let (row, col) = ((cell / self.size) as f32, (cell % self.size) as f32);
            let distance = ((row - center).abs()).max((col - center).abs());
            scores[cell] = score + 1.0 - distance / self.size as f32;
        }

        let total: f32 = scores.iter().sum();
        let policy = if total > 0.0 {
            scores.iter().map(|s| s / total).collect()
        } else {
            vec![1.0 / area as f32; area]
        };

        let value = if own_best >= self.num_to_win {
            0.9
        } else if their_best >= self.num_to_win {
            -0.6
        } else {
            0.5 * ((own_best as f32 - their_best as f32) / 2.0).tanh()
        };

        Ok(Evaluation::new(policy, value))
    }
}

impl Network for HeuristicNetwork {
    fn evaluate(&self, batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError> {
        batch.iter().map(|obs| self.evaluate_one(obs)).collect()
    }
}
