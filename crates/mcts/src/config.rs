//! MCTS configuration parameters.
//!
//! These parameters control the search budget, PUCT exploration, parallel
//! leaf batching and how the final action is picked from root visit counts.

use alphazero_core::{AlphaZeroError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// MCTS configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Number of simulations per search.
    pub num_simulations: usize,

    /// Leaves collected per network batch, and worker threads selecting them.
    /// 1 makes the search strictly sequential.
    pub parallel_leaves: usize,

    /// PUCT exploration constant base.
    /// Part of the formula: c = c_puct_init + ln((N + c_puct_base + 1) / c_puct_base)
    pub c_puct_base: f32,

    /// PUCT exploration constant init.
    pub c_puct_init: f32,

    /// Mix Dirichlet noise into the root priors.
    pub root_noise: bool,

    /// Dirichlet noise alpha.
    /// Higher values = more uniform noise, lower = more concentrated.
    pub dirichlet_alpha: f32,

    /// Fraction of prior replaced with Dirichlet noise at root.
    pub exploration_fraction: f32,

    /// Temperature for action selection.
    /// - ~0.0: always pick highest visit count (greedy)
    /// - 1.0: sample proportional to visit counts
    pub temperature: f32,

    /// Move number at which a match driver drops temperature to 0.
    /// Set to 0 to always use the configured temperature.
    pub temperature_drop_move: usize,

    /// Always pick the most visited action, whatever the temperature.
    pub deterministic: bool,

    /// Penalty per in-flight simulation subtracted from a child's value.
    pub virtual_loss: f32,

    /// Value assumed for a child that has never been visited.
    pub first_play_value: f32,

    /// Wall-clock limit per search in milliseconds. Checked between batches.
    pub time_budget_ms: Option<u64>,

    /// Keep the subtree under the played move for the next search.
    pub reuse_tree: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 800,
            parallel_leaves: 8,
            c_puct_base: 19652.0,
            c_puct_init: 1.25,
            root_noise: true,
            dirichlet_alpha: 0.03,
            exploration_fraction: 0.25,
            temperature: 1.0,
            temperature_drop_move: 30,
            deterministic: false,
            virtual_loss: 1.0,
            first_play_value: 0.0,
            time_budget_ms: None,
            reuse_tree: false,
        }
    }
}

impl MctsConfig {
    /// Create a new config with the specified number of simulations.
    pub fn with_simulations(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            ..Default::default()
        }
    }

    /// Create a config for evaluation games (no noise, greedy action).
    pub fn for_evaluation(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            root_noise: false,
            deterministic: true,
            temperature: 0.0,
            temperature_drop_move: 0,
            ..Default::default()
        }
    }

    /// Same config with a different batch width.
    pub fn with_parallel_leaves(mut self, parallel_leaves: usize) -> Self {
        self.parallel_leaves = parallel_leaves;
        self
    }

    /// Get the effective temperature for a given move number. Zero when
    /// `deterministic` is set.
    pub fn effective_temperature(&self, move_number: usize) -> f32 {
        let dropped = self.temperature_drop_move > 0 && move_number >= self.temperature_drop_move;
        if self.deterministic || dropped {
            0.0
        } else {
            self.temperature
        }
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    /// Check ranges. A zero simulation budget is accepted here and rejected
    /// by the search only when the root is not terminal.
    ///
    /// # Errors
    /// `AlphaZeroError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(AlphaZeroError::InvalidConfig(msg));

        if self.parallel_leaves == 0 {
            return invalid("parallel_leaves must be at least 1".to_string());
        }
        if !(self.c_puct_base > 0.0 && self.c_puct_base.is_finite()) {
            return invalid(format!("c_puct_base must be positive, got {}", self.c_puct_base));
        }
        if !self.c_puct_init.is_finite() || self.c_puct_init < 0.0 {
            return invalid(format!("c_puct_init must be >= 0, got {}", self.c_puct_init));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return invalid(format!("temperature must be >= 0, got {}", self.temperature));
        }
        if !(0.0..=1.0).contains(&self.exploration_fraction) {
            return invalid(format!(
                "exploration_fraction must be in [0, 1], got {}",
                self.exploration_fraction
            ));
        }
        if self.root_noise && !(self.dirichlet_alpha > 0.0 && self.dirichlet_alpha.is_finite()) {
            return invalid(format!(
                "dirichlet_alpha must be positive, got {}",
                self.dirichlet_alpha
            ));
        }
        if !self.virtual_loss.is_finite() || self.virtual_loss < 0.0 {
            return invalid(format!("virtual_loss must be >= 0, got {}", self.virtual_loss));
        }
        if !(-1.0..=1.0).contains(&self.first_play_value) {
            return invalid(format!(
                "first_play_value must be in [-1, 1], got {}",
                self.first_play_value
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.num_simulations, 800);
        assert_eq!(config.parallel_leaves, 8);
        assert!((config.c_puct_base - 19652.0).abs() < 1e-5);
        assert!((config.c_puct_init - 1.25).abs() < 1e-5);
        assert_eq!(config.first_play_value, 0.0);
        assert!(!config.deterministic);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_evaluation() {
        let config = MctsConfig::for_evaluation(400);
        assert_eq!(config.num_simulations, 400);
        assert!(config.deterministic);
        assert!(!config.root_noise);
        assert_eq!(config.effective_temperature(0), 0.0);
    }

    #[test]
    fn test_effective_temperature() {
        let config = MctsConfig::default();
        assert!((config.effective_temperature(29) - 1.0).abs() < 1e-5);
        assert_eq!(config.effective_temperature(30), 0.0);

        let config = MctsConfig {
            temperature_drop_move: 0,
            ..MctsConfig::default()
        };
        assert!((config.effective_temperature(100) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            MctsConfig::default().with_parallel_leaves(0),
            MctsConfig {
                c_puct_base: 0.0,
                ..MctsConfig::default()
            },
            MctsConfig {
                temperature: -1.0,
                ..MctsConfig::default()
            },
            MctsConfig {
                exploration_fraction: 1.5,
                ..MctsConfig::default()
            },
            MctsConfig {
                dirichlet_alpha: 0.0,
                ..MctsConfig::default()
            },
            MctsConfig {
                first_play_value: 2.0,
                ..MctsConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }

        // Alpha is irrelevant without noise
        let config = MctsConfig {
            dirichlet_alpha: 0.0,
            root_noise: false,
            ..MctsConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_table() {
        let config: MctsConfig = serde_json::from_str(
            r#"{"num_simulations": 64, "parallel_leaves": 1, "time_budget_ms": 250}"#,
        )
        .unwrap();
        assert_eq!(config.num_simulations, 64);
        assert_eq!(config.parallel_leaves, 1);
        assert_eq!(config.time_budget(), Some(Duration::from_millis(250)));
        assert_eq!(config.c_puct_init, MctsConfig::default().c_puct_init);
    }
}
