//! Turning root visit counts into a move and a training-style policy.
//!
//! - greedy (deterministic, or temperature below [`MIN_TEMPERATURE`]):
//!   most visited action, lowest id on ties, one-hot policy
//! - otherwise: `pi(a) ∝ N(a)^(1/τ)` and the action is sampled from `pi`

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Temperatures below this are treated as zero.
pub const MIN_TEMPERATURE: f32 = 1e-3;

/// True if the move should be the argmax rather than a sample.
pub fn is_greedy(temperature: f32, deterministic: bool) -> bool {
    deterministic || temperature < MIN_TEMPERATURE
}

/// Most visited action, lowest id on ties. `None` if there are no actions.
pub fn greedy_action(visit_counts: &[(usize, u32)]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for &(action, count) in visit_counts {
        match best {
            Some((best_action, best_count))
                if count < best_count || (count == best_count && action > best_action) => {}
            _ => best = Some((action, count)),
        }
    }
    best.map(|(action, _)| action)
}

/// Policy over all `num_actions` indices from root visit counts. Actions
/// without a child (illegal ones) get zero.
///
/// If nothing was visited the mass is spread uniformly over the children,
/// or placed on the lowest id when greedy.
pub fn visit_distribution(
    visit_counts: &[(usize, u32)],
    num_actions: usize,
    temperature: f32,
    deterministic: bool,
) -> Vec<f32> {
    let mut policy = vec![0.0; num_actions];
    if visit_counts.is_empty() {
        return policy;
    }

    if is_greedy(temperature, deterministic) {
        if let Some(action) = greedy_action(visit_counts) {
            policy[action] = 1.0;
        }
        return policy;
    }

    let max = visit_counts.iter().map(|&(_, c)| c).max().unwrap_or(0);
    if max == 0 {
        let p = 1.0 / visit_counts.len() as f32;
        for &(action, _) in visit_counts {
            policy[action] = p;
        }
        return policy;
    }

    // Exact normalized counts at τ = 1; otherwise powers of counts scaled by
    // the maximum so small temperatures cannot overflow
    let weights: Vec<f64> = if temperature == 1.0 {
        visit_counts.iter().map(|&(_, c)| f64::from(c)).collect()
    } else {
        let inv_temp = 1.0 / f64::from(temperature);
        visit_counts
            .iter()
            .map(|&(_, c)| (f64::from(c) / f64::from(max)).powf(inv_temp))
            .collect()
    };
    let total: f64 = weights.iter().sum();
    for (&(action, _), w) in visit_counts.iter().zip(weights) {
        policy[action] = (w / total) as f32;
    }
    policy
}

/// Sample an action index from `policy`. `None` if it holds no mass.
pub fn sample_action<R: Rng + ?Sized>(policy: &[f32], rng: &mut R) -> Option<usize> {
    WeightedIndex::new(policy).ok().map(|dist| dist.sample(rng))
}
