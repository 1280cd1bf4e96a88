//! MCTS node shared by concurrent search workers.
//!
//! Every statistic is an atomic so workers update the tree through shared
//! references. Children live in a `OnceLock`: a node is expanded exactly
//! once, by the worker that won its expansion claim, and the child slice is
//! immutable from then on. A parent owns its children outright, so dropping
//! the root frees the whole tree.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::OnceLock;

/// `f64` accumulator built on `AtomicU64` bit patterns.
#[derive(Debug, Default)]
struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    fn fetch_add(&self, delta: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

/// A node in the search tree.
///
/// `value_sum` is accumulated from the perspective of the player to move at
/// this node. `virtual_loss` counts simulations currently in flight through
/// the node and is back to zero once they have all been backed up or
/// rolled back.
#[derive(Debug)]
pub struct Node {
    action: Option<usize>,
    prior: f32,
    visit_count: AtomicU32,
    value_sum: AtomicF64,
    virtual_loss: AtomicU32,
    claimed: AtomicBool,
    children: OnceLock<Box<[Node]>>,
}

impl Node {
    /// Create a new unexpanded child reached by `action`.
    pub(crate) fn new(action: usize, prior: f32) -> Self {
        Self::with_action(Some(action), prior)
    }

    /// Create the root node.
    pub(crate) fn root() -> Self {
        Self::with_action(None, 1.0)
    }

    fn with_action(action: Option<usize>, prior: f32) -> Self {
        Self {
            action,
            prior,
            visit_count: AtomicU32::new(0),
            value_sum: AtomicF64::default(),
            virtual_loss: AtomicU32::new(0),
            claimed: AtomicBool::new(false),
            children: OnceLock::new(),
        }
    }

    /// Action that led to this node (`None` for the root).
    pub fn action(&self) -> Option<usize> {
        self.action
    }

    /// Prior probability assigned when the parent was expanded.
    pub fn prior(&self) -> f32 {
        self.prior
    }

    /// Number of backups that passed through this node.
    pub fn visit_count(&self) -> u32 {
        self.visit_count.load(Ordering::Acquire)
    }

    pub fn value_sum(&self) -> f64 {
        self.value_sum.load()
    }

    /// Mean value W/N, or `None` before the first backup.
    pub fn mean_value(&self) -> Option<f32> {
        let visits = self.visit_count();
        (visits > 0).then(|| (self.value_sum() / f64::from(visits)) as f32)
    }

    /// Simulations currently in flight through this node.
    pub fn virtual_loss(&self) -> u32 {
        self.virtual_loss.load(Ordering::Acquire)
    }

    pub fn is_expanded(&self) -> bool {
        self.children.get().is_some()
    }

    /// Children in ascending action order; empty until expanded.
    pub fn children(&self) -> &[Node] {
        self.children.get().map(|c| &c[..]).unwrap_or(&[])
    }

    /// Child reached by `action`, if the node is expanded and it is legal.
    pub fn child(&self, action: usize) -> Option<&Node> {
        let children = self.children();
        children
            .binary_search_by_key(&Some(action), |c| c.action)
            .ok()
            .map(|i| &children[i])
    }

    /// Try to become the one worker that expands this node.
    pub(crate) fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Give up a claim after a failed evaluation so the node can be retried.
    pub(crate) fn release_claim(&self) {
        self.claimed.store(false, Ordering::Release);
    }

    /// Install the children. Returns false if the node was already expanded,
    /// in which case the existing children are kept.
    pub(crate) fn set_children(&self, mut children: Vec<Node>) -> bool {
        children.sort_by_key(|c| c.action);
        self.children.set(children.into_boxed_slice()).is_ok()
    }

    pub(crate) fn add_virtual_loss(&self) {
        self.virtual_loss.fetch_add(1, Ordering::AcqRel);
    }

    /// Remove one in-flight simulation. Never goes below zero.
    pub(crate) fn revert_virtual_loss(&self) {
        let result = self
            .virtual_loss
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |vl| vl.checked_sub(1));
        debug_assert!(result.is_ok(), "virtual loss reverted more often than applied");
    }

    /// Back up one simulation: count the visit, add `value`, and retire
    /// the virtual loss the simulation applied on its way down.
    pub(crate) fn record(&self, value: f32) {
        self.value_sum.fetch_add(f64::from(value));
        self.visit_count.fetch_add(1, Ordering::AcqRel);
        self.revert_virtual_loss();
    }

    /// Mutable children, only reachable with exclusive access to the tree.
    pub(crate) fn children_mut(&mut self) -> Option<&mut [Node]> {
        self.children.get_mut().map(|c| &mut c[..])
    }

    pub(crate) fn set_prior(&mut self, prior: f32) {
        self.prior = prior;
    }

    /// Detach the child reached by `action` and make it a root, dropping its
    /// siblings. Returns `None` if there is no such child.
    pub(crate) fn into_child(self, action: usize) -> Option<Node> {
        let children = self.children.into_inner()?;
        let mut child = children
            .into_vec()
            .into_iter()
            .find(|c| c.action == Some(action))?;
        child.action = None;
        child.prior = 1.0;
        *child.claimed.get_mut() = false;
        Some(child)
    }

    /// Number of nodes in this subtree, including itself.
    pub fn subtree_size(&self) -> usize {
        1 + self.children().iter().map(Node::subtree_size).sum::<usize>()
    }
}
