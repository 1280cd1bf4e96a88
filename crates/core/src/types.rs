//! Domain types with enforced invariants.
//!
//! - Player: one of the two sides, black moves first
//! - Outcome: win/loss/draw of a finished game
//! - Policy: probability distribution summing to 1.0
//! - Value: game value in range [-1, 1]

use crate::{AlphaZeroError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance for policy sum validation.
pub const POLICY_SUM_TOLERANCE: f32 = 1e-5;

/// One of the two players. Black always moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Black,
    White,
}

impl Player {
    /// The other player.
    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Black => f.write_str("black"),
            Self::White => f.write_str("white"),
        }
    }
}

/// Result of a finished game, relative to some player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Numeric value: +1 win, -1 loss, 0 draw.
    pub fn value(self) -> f32 {
        match self {
            Self::Win => 1.0,
            Self::Loss => -1.0,
            Self::Draw => 0.0,
        }
    }

    /// The same result seen by the opponent.
    pub fn flip(self) -> Self {
        match self {
            Self::Win => Self::Loss,
            Self::Loss => Self::Win,
            Self::Draw => Self::Draw,
        }
    }
}

/// A probability distribution over actions.
///
/// Invariant: All values are non-negative and sum to 1.0 (±1e-5).
///
/// # Example
/// ```
/// use alphazero_core::Policy;
///
/// let policy = Policy::new(vec![0.3, 0.5, 0.2]).unwrap();
/// assert!((policy.sum() - 1.0).abs() < 1e-5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Policy(Vec<f32>);

impl Policy {
    /// Create a new policy from a probability distribution.
    ///
    /// # Errors
    /// Returns `AlphaZeroError::InvalidPolicy` if the vector is empty, holds a
    /// negative or non-finite entry, or does not sum to 1.0 (±1e-5).
    pub fn new(probs: Vec<f32>) -> Result<Self> {
        check_entries(&probs)?;

        let sum: f32 = probs.iter().sum();
        if (sum - 1.0).abs() > POLICY_SUM_TOLERANCE {
            return Err(AlphaZeroError::InvalidPolicy(format!(
                "policy sum {} is not 1.0 (tolerance {})",
                sum, POLICY_SUM_TOLERANCE
            )));
        }

        Ok(Self(probs))
    }

    /// Restrict raw network priors to `legal` actions and renormalize.
    ///
    /// The result has one entry per legal action, in the order of `legal`.
    /// When the legal mass is zero or not finite the distribution falls back
    /// to uniform over the legal actions.
    ///
    /// # Errors
    /// Returns error if `legal` is empty or names an index past `raw`.
    pub fn masked(raw: &[f32], legal: &[usize]) -> Result<Self> {
        if legal.is_empty() {
            return Err(AlphaZeroError::InvalidPolicy(
                "cannot mask a policy with no legal actions".to_string(),
            ));
        }

        let mut priors = Vec::with_capacity(legal.len());
        for &action in legal {
            let p = *raw.get(action).ok_or_else(|| {
                AlphaZeroError::InvalidPolicy(format!(
                    "legal action {} outside policy of length {}",
                    action,
                    raw.len()
                ))
            })?;
            priors.push(if p.is_finite() && p > 0.0 { p } else { 0.0 });
        }

        let sum: f32 = priors.iter().sum();
        if sum > 0.0 && sum.is_finite() {
            Ok(Self(priors.into_iter().map(|p| p / sum).collect()))
        } else {
            Self::uniform(legal.len())
        }
    }

    /// Create a uniform policy over the given number of actions.
    ///
    /// # Errors
    /// Returns error if num_actions is zero.
    pub fn uniform(num_actions: usize) -> Result<Self> {
        if num_actions == 0 {
            return Err(AlphaZeroError::InvalidPolicy(
                "cannot create uniform policy with 0 actions".to_string(),
            ));
        }

        let prob = 1.0 / num_actions as f32;
        Ok(Self(vec![prob; num_actions]))
    }

    /// All mass on `index`.
    ///
    /// # Errors
    /// Returns error if `index >= num_actions`.
    pub fn one_hot(num_actions: usize, index: usize) -> Result<Self> {
        if index >= num_actions {
            return Err(AlphaZeroError::InvalidPolicy(format!(
                "one-hot index {} outside {} actions",
                index, num_actions
            )));
        }
        let mut probs = vec![0.0; num_actions];
        probs[index] = 1.0;
        Ok(Self(probs))
    }

    /// Get the probability at the given index.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.0.get(index).copied()
    }

    /// Get the number of actions in this policy.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the policy is empty (never true for valid policies).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the sum of all probabilities (should be ~1.0).
    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    /// Index of the maximum probability, lowest index on ties.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &p) in self.0.iter().enumerate() {
            if p > self.0[best] {
                best = i;
            }
        }
        best
    }

    /// Get the underlying vector (consumes self).
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Get a reference to the underlying slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl std::ops::Index<usize> for Policy {
    type Output = f32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

fn check_entries(values: &[f32]) -> Result<()> {
    if values.is_empty() {
        return Err(AlphaZeroError::InvalidPolicy(
            "policy cannot be empty".to_string(),
        ));
    }
    if values.iter().any(|&p| !p.is_finite() || p < 0.0) {
        return Err(AlphaZeroError::InvalidPolicy(
            "policy contains negative or non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// A game value estimate.
///
/// Invariant: Value is in range [-1, 1] where:
/// - +1 means the player to move is winning
/// - -1 means the player to move is losing
/// - 0 means a draw or equal position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Value(f32);

impl Value {
    /// Value for a win.
    pub const WIN: Self = Self(1.0);

    /// Value for a loss.
    pub const LOSS: Self = Self(-1.0);

    /// Value for a draw.
    pub const DRAW: Self = Self(0.0);

    /// Create a value by clamping to [-1, 1].
    pub fn clamped(value: f32) -> Self {
        Self(value.clamp(-1.0, 1.0))
    }

    /// Get the underlying value.
    pub fn get(self) -> f32 {
        self.0
    }
}

impl From<Outcome> for Value {
    fn from(outcome: Outcome) -> Self {
        Self(outcome.value())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}
