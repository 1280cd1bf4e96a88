//! Search tree rooted at a game state.
//!
//! The tree owns its root node, and through it every other node. After a
//! move is committed it can be re-rooted at the child for that move, keeping
//! the statistics gathered under it.

use crate::expand;
use crate::node::Node;
use alphazero_core::{Game, Result};

/// A search tree and the state its root stands for.
#[derive(Debug)]
pub struct SearchTree<S> {
    state: S,
    root: Node,
    /// Root priors before noise was mixed in.
    base_priors: Option<Vec<f32>>,
}

impl<S> SearchTree<S> {
    /// Create a tree with a single unexpanded root.
    pub fn new(state: S) -> Self {
        Self {
            state,
            root: Node::root(),
            base_priors: None,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Total number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.root.subtree_size()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Mix `noise` into the root priors, replacing any noise mixed in by an
    /// earlier search of the same root.
    pub(crate) fn mix_root_noise(&mut self, noise: &[f32], fraction: f32) {
        let root = &self.root;
        let base = self
            .base_priors
            .get_or_insert_with(|| root.children().iter().map(Node::prior).collect());
        expand::mix_noise(&mut self.root, base, noise, fraction);
    }

    /// Re-root at the child reached by `action`.
    ///
    /// The subtree under that child is kept when the root was expanded;
    /// otherwise the new tree starts from a fresh root.
    ///
    /// # Errors
    /// Whatever `game.apply` reports for `action` in the root state.
    pub fn advance<G>(self, game: &G, action: usize) -> Result<Self>
    where
        G: Game<State = S>,
    {
        let state = game.apply(&self.state, action)?;
        let root = self.root.into_child(action).unwrap_or_else(Node::root);
        Ok(Self {
            state,
            root,
            base_priors: None,
        })
    }
}
