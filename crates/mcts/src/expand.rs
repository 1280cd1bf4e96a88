//! Node expansion and root noise.

use crate::node::Node;
use alphazero_core::{AlphaZeroError, Policy};

/// Create one child per legal action with the network priors restricted to
/// the legal set and renormalized.
///
/// Returns `Ok(false)` if another worker expanded the node first; its
/// children are kept.
///
/// # Errors
/// `NoLegalActions` for an empty legal set, `InvalidPolicy` if a legal
/// action has no prior.
pub(crate) fn expand(node: &Node, legal: &[usize], raw_priors: &[f32]) -> Result<bool, AlphaZeroError> {
    if legal.is_empty() {
        return Err(AlphaZeroError::NoLegalActions);
    }
    let priors = Policy::masked(raw_priors, legal)?;
    let children = legal
        .iter()
        .zip(priors.as_slice())
        .map(|(&action, &prior)| Node::new(action, prior))
        .collect();
    Ok(node.set_children(children))
}

/// Blend noise into the root priors:
/// `prior = (1 - fraction) * base + fraction * noise`.
///
/// `base` holds the priors the root had before any noise, so calling this
/// again on a re-searched root replaces the previous noise instead of
/// stacking on it.
pub(crate) fn mix_noise(root: &mut Node, base: &[f32], noise: &[f32], fraction: f32) {
    let Some(children) = root.children_mut() else {
        return;
    };
    for ((child, &p), &n) in children.iter_mut().zip(base).zip(noise) {
        child.set_prior((1.0 - fraction) * p + fraction * n);
    }
}
