//! Leaf batching for network evaluation.
//!
//! Workers hand their leaves to a `LeafBatch`, which calls the network once
//! for the whole batch. When several paths of one batch reach the same
//! unexpanded node, only the first claims it. The others are rolled back by
//! the driver and selected again in a later batch, once the node has
//! children to descend into.

use crate::network::{Evaluation, Network, NetworkError};
use crate::path::SearchPath;

/// A claimed leaf waiting for its evaluation.
pub(crate) struct PendingLeaf<'t, S> {
    pub(crate) path: SearchPath<'t>,
    pub(crate) state: S,
    pub(crate) observation: Vec<f32>,
}

impl<'t, S> PendingLeaf<'t, S> {
    pub(crate) fn new(path: SearchPath<'t>, state: S, observation: Vec<f32>) -> Self {
        Self {
            path,
            state,
            observation,
        }
    }

    pub(crate) fn backup(self, value: f32) {
        self.path.backup(value);
    }

    /// Drop the simulation and free the leaf for a later expansion attempt.
    pub(crate) fn abandon(self) {
        self.path.leaf().release_claim();
        self.path.revert();
    }
}

/// Leaves collected for one network call.
pub(crate) struct LeafBatch<'t, S> {
    leaves: Vec<PendingLeaf<'t, S>>,
}

impl<'t, S> LeafBatch<'t, S> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            leaves: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, leaf: PendingLeaf<'t, S>) {
        self.leaves.push(leaf);
    }

    pub(crate) fn len(&self) -> usize {
        self.leaves.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Release every claim and roll back every path.
    pub(crate) fn abandon(self) {
        for leaf in self.leaves {
            leaf.abandon();
        }
    }

    /// Evaluate all leaves with a single network call.
    ///
    /// Each leaf comes back paired with its own result. A failed call, or a
    /// result count that does not match the batch, fails every member; a
    /// malformed individual output fails only its leaf.
    pub(crate) fn evaluate<N: Network + ?Sized>(
        self,
        network: &N,
        num_actions: usize,
    ) -> Vec<(PendingLeaf<'t, S>, Result<Evaluation, NetworkError>)> {
        if self.leaves.is_empty() {
            return Vec::new();
        }

        let inputs: Vec<&[f32]> = self.leaves.iter().map(|l| l.observation.as_slice()).collect();
        let expected = inputs.len();
        let outputs = network.evaluate(&inputs).and_then(|evals| {
            if evals.len() == expected {
                Ok(evals)
            } else {
                Err(NetworkError::BatchSizeMismatch {
                    expected,
                    got: evals.len(),
                })
            }
        });
        drop(inputs);

        match outputs {
            Ok(evals) => self
                .leaves
                .into_iter()
                .zip(evals)
                .map(|(leaf, eval)| {
                    let checked = eval.validate(num_actions).map(|()| eval);
                    (leaf, checked)
                })
                .collect(),
            Err(err) => self
                .leaves
                .into_iter()
                .map(|leaf| (leaf, Err(err.clone())))
                .collect(),
        }
    }
}
