//! Arena configuration.
//!
//! Loaded from a TOML file given with `--config` or the `ALPHAZERO_CONFIG`
//! environment variable; every field has a default, so a partial file (or
//! no file at all) is valid. Command-line flags override the loaded values.
//!
//! ```toml
//! variant = "gravity"
//! size = 9
//! num_to_win = 4
//! games = 20
//!
//! [black]
//! network = "heuristic"
//!
//! [black.mcts]
//! num_simulations = 400
//! parallel_leaves = 8
//!
//! [white.mcts]
//! num_simulations = 200
//! ```

use alphazero_mcts::MctsConfig;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "ALPHAZERO_CONFIG";

/// Which Gomoku rules to play.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Any empty cell.
    #[default]
    Freestyle,
    /// Stones fall to the lowest empty cell of a column.
    Gravity,
}

/// Leaf evaluator used by a player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    /// Uniform priors, neutral value.
    #[default]
    Uniform,
    /// Hand-written line patterns.
    Heuristic,
}

/// One side of a match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub network: NetworkKind,
    pub mcts: MctsConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub variant: Variant,
    pub size: usize,
    pub num_to_win: usize,
    /// Positions stacked into each observation.
    pub history: usize,
    pub games: usize,
    pub seed: u64,
    /// Games still running after this many plies are scored as draws.
    pub max_plies: usize,
    pub black: PlayerConfig,
    pub white: PlayerConfig,
    /// Where to write the JSON match summary.
    pub output: Option<PathBuf>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Freestyle,
            size: 9,
            num_to_win: 5,
            history: 2,
            games: 10,
            seed: 42,
            max_plies: 400,
            black: PlayerConfig::default(),
            white: PlayerConfig::default(),
            output: None,
        }
    }
}

impl ArenaConfig {
    /// Load from `path`, or from `ALPHAZERO_CONFIG` when no path is given.
    /// Falls back to defaults when neither is set.
    ///
    /// # Errors
    /// Fails if the chosen file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::from_path(&path)
            }
            None => {
                debug!("No config file given, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Set the simulation count of both players.
    pub fn set_simulations(&mut self, simulations: usize) {
        self.black.mcts.num_simulations = simulations;
        self.white.mcts.num_simulations = simulations;
    }

    /// Set the batch width of both players.
    pub fn set_parallel_leaves(&mut self, parallel_leaves: usize) {
        self.black.mcts.parallel_leaves = parallel_leaves;
        self.white.mcts.parallel_leaves = parallel_leaves;
    }
}
