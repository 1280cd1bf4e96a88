//! PUCT child selection with virtual loss.
//!
//! score(child) = Q_eff(child) + U(child), where
//! - Q is the child's mean value negated into the parent's perspective,
//!   or `first_play_value` for an unvisited child,
//! - Q_eff folds `virtual_loss` per in-flight simulation into that mean:
//!   (N * Q - penalty * VL) / (N + VL),
//! - U = c(N_parent) * P * sqrt(N_parent) / (1 + N + VL) with
//!   c(N) = c_puct_init + ln((N + c_puct_base + 1) / c_puct_base).

use crate::config::MctsConfig;
use crate::node::Node;

/// Visit-dependent exploration coefficient.
pub fn exploration_coefficient(parent_visits: u32, config: &MctsConfig) -> f32 {
    let n = parent_visits as f32;
    config.c_puct_init + ((n + config.c_puct_base + 1.0) / config.c_puct_base).ln()
}

/// Value of `child` from its parent's point of view, with pending
/// simulations counted as losses.
pub fn effective_value(child: &Node, config: &MctsConfig) -> f32 {
    let n = child.visit_count() as f32;
    let vl = child.virtual_loss() as f32;
    let q = match child.mean_value() {
        Some(mean) => -mean,
        None => config.first_play_value,
    };
    if vl > 0.0 {
        (n * q - config.virtual_loss * vl) / (n + vl)
    } else {
        q
    }
}

/// PUCT score of `child` under a parent with `parent_visits` visits.
pub fn score(parent_visits: u32, child: &Node, config: &MctsConfig) -> f32 {
    let c = exploration_coefficient(parent_visits, config);
    // sqrt(max(N, 1)) keeps priors meaningful on the very first descent
    let sqrt_parent = (parent_visits.max(1) as f32).sqrt();
    let pending = (child.visit_count() + child.virtual_loss()) as f32;
    let u = c * child.prior() * sqrt_parent / (1.0 + pending);
    effective_value(child, config) + u
}

/// Highest scoring child and its action, lowest action on ties. `None` if
/// the node has no children.
pub(crate) fn select_child<'t>(node: &'t Node, config: &MctsConfig) -> Option<(usize, &'t Node)> {
    let parent_visits = node.visit_count();
    let mut best: Option<(usize, &'t Node)> = None;
    let mut best_score = f32::NEG_INFINITY;

    for child in node.children() {
        let Some(action) = child.action() else {
            continue;
        };
        let s = score(parent_visits, child, config);
        // Children are sorted by action, so strict > keeps the lowest id
        if best.is_none() || s > best_score {
            best = Some((action, child));
            best_score = s;
        }
    }

    best
}
