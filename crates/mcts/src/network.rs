//! Network abstraction for leaf evaluation.
//!
//! The search only needs a function from encoded positions to
//! (priors, value). Implementations decide how that is computed: a neural
//! network runtime, a hand-written heuristic, or a fixed stub in tests.

use std::sync::Arc;
use thiserror::Error;

/// Errors a network can report for a batch or for one of its members.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("network evaluation failed: {0}")]
    Failed(String),

    #[error("network returned {got} results for a batch of {expected}")]
    BatchSizeMismatch { expected: usize, got: usize },

    #[error("malformed network output: {0}")]
    MalformedOutput(String),
}

/// Evaluation result: prior policy + value estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Prior for every action index, legal or not.
    /// Length must equal `game.num_actions()`.
    pub policy: Vec<f32>,

    /// Value estimate for the player to move, in [-1, 1].
    pub value: f32,
}

impl Evaluation {
    pub fn new(policy: Vec<f32>, value: f32) -> Self {
        Self { policy, value }
    }

    /// Uniform priors over `num_actions` with the given value.
    pub fn uniform(num_actions: usize, value: f32) -> Self {
        let prior = if num_actions == 0 {
            0.0
        } else {
            1.0 / num_actions as f32
        };
        Self::new(vec![prior; num_actions], value)
    }

    /// Check the output shape and ranges before it touches the tree.
    ///
    /// # Errors
    /// `MalformedOutput` for a wrong policy length, a negative or non-finite
    /// prior, or a value that is not finite. Values slightly outside
    /// [-1, 1] are accepted and clamped on use.
    pub fn validate(&self, num_actions: usize) -> Result<(), NetworkError> {
        if self.policy.len() != num_actions {
            return Err(NetworkError::MalformedOutput(format!(
                "policy has {} entries, expected {}",
                self.policy.len(),
                num_actions
            )));
        }
        if self.policy.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(NetworkError::MalformedOutput(
                "policy contains negative or non-finite priors".to_string(),
            ));
        }
        if !self.value.is_finite() {
            return Err(NetworkError::MalformedOutput(format!(
                "value {} is not finite",
                self.value
            )));
        }
        Ok(())
    }
}

/// Trait for batched position evaluation.
///
/// Called once per batch of leaves with every encoded position in that
/// batch. Must return one `Evaluation` per input, in input order. An `Err`
/// drops every simulation in the batch; the search keeps going.
pub trait Network: Send + Sync {
    fn evaluate(&self, batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError>;
}

impl<T: Network + ?Sized> Network for &T {
    fn evaluate(&self, batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError> {
        (**self).evaluate(batch)
    }
}

impl<T: Network + ?Sized> Network for Box<T> {
    fn evaluate(&self, batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError> {
        (**self).evaluate(batch)
    }
}

impl<T: Network + ?Sized> Network for Arc<T> {
    fn evaluate(&self, batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError> {
        (**self).evaluate(batch)
    }
}

/// Uniform priors and a neutral value for every position.
///
/// Search guided by this network is plain PUCT over terminal outcomes,
/// which is enough to find short tactics and to exercise the search
/// machinery without a trained model.
#[derive(Clone, Debug)]
pub struct UniformNetwork {
    num_actions: usize,
}

impl UniformNetwork {
    pub fn new(num_actions: usize) -> Self {
        Self { num_actions }
    }
}

impl Network for UniformNetwork {
    fn evaluate(&self, batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError> {
        Ok(batch
            .iter()
            .map(|_| Evaluation::uniform(self.num_actions, 0.0))
            .collect())
    }
}
