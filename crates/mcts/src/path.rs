//! Search paths and value backup.
//!
//! A path applies one unit of virtual loss to every node it visits on the
//! way down. It is settled exactly once: either `backup` turns each unit
//! into a real visit, or `revert` removes them. A path dropped without being
//! settled reverts itself, so an aborted search never leaves virtual loss
//! behind in the tree.

use crate::node::Node;
use smallvec::SmallVec;

/// Depth kept inline before the path spills to the heap.
const INLINE_DEPTH: usize = 32;

/// Nodes visited by one simulation, root first.
#[derive(Debug)]
pub(crate) struct SearchPath<'t> {
    nodes: SmallVec<[&'t Node; INLINE_DEPTH]>,
}

impl<'t> SearchPath<'t> {
    /// Start a path at `root`, applying virtual loss to it.
    pub(crate) fn new(root: &'t Node) -> Self {
        root.add_virtual_loss();
        let mut nodes = SmallVec::new();
        nodes.push(root);
        Self { nodes }
    }

    /// Descend into `node`, applying virtual loss to it.
    pub(crate) fn push(&mut self, node: &'t Node) {
        node.add_virtual_loss();
        self.nodes.push(node);
    }

    /// Last node on the path.
    pub(crate) fn leaf(&self) -> &'t Node {
        // A path always holds at least its root
        self.nodes[self.nodes.len() - 1]
    }

    /// Number of actions taken from the root.
    pub(crate) fn depth(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Propagate `leaf_value` (perspective of the player to move at the
    /// leaf) to the root, negating it at every level.
    pub(crate) fn backup(mut self, leaf_value: f32) {
        let mut value = leaf_value;
        for node in std::mem::take(&mut self.nodes).into_iter().rev() {
            node.record(value);
            value = -value;
        }
    }

    /// Drop this simulation's contribution: remove its virtual loss without
    /// recording a visit.
    pub(crate) fn revert(mut self) {
        for node in std::mem::take(&mut self.nodes) {
            node.revert_virtual_loss();
        }
    }
}

impl Drop for SearchPath<'_> {
    fn drop(&mut self) {
        for node in self.nodes.drain(..) {
            node.revert_virtual_loss();
        }
    }
}
