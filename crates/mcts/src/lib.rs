//! Parallel Monte Carlo Tree Search for AlphaZero-style agents.
//!
//! The search works with any game implementing `alphazero_core::Game` and
//! any leaf evaluator implementing [`Network`].
//!
//! # Features
//!
//! - **PUCT Selection**: visit-dependent exploration coefficient
//! - **Parallel Leaves**: up to `parallel_leaves` simulations per batch,
//!   kept apart by virtual loss and evaluated with one network call
//! - **Dirichlet Noise**: exploration noise mixed into the root priors
//! - **Temperature Sampling**: visit-count policy with greedy or sampled moves
//! - **Tree Reuse**: the subtree under the played move can seed the next search
//! - **Cancellation**: a [`StopHandle`] or time budget ends the search early
//!
//! # Example
//!
//! ```
//! use alphazero_core::Game;
//! use alphazero_gomoku::Gomoku;
//! use alphazero_mcts::{Mcts, MctsConfig, UniformNetwork};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let game = Gomoku::new(3, 3).unwrap();
//! let state = game.initial_state();
//!
//! let config = MctsConfig::for_evaluation(100).with_parallel_leaves(4);
//! let network = UniformNetwork::new(game.num_actions());
//! let mut mcts = Mcts::new(config, network, ChaCha8Rng::seed_from_u64(42)).unwrap();
//!
//! let result = mcts.search(&game, &state).unwrap();
//! println!("Best action: {:?}", result.action);
//! println!("Root value: {}", result.root_value);
//!
//! let policy = result.typed_policy().expect("valid policy");
//! assert!((policy.sum() - 1.0).abs() < 1e-5);
//! ```

mod batch;
pub mod config;
pub mod error;
mod expand;
pub mod network;
mod node;
mod path;
pub mod policy;
pub mod puct;
pub mod search;
pub mod tree;

pub use config::MctsConfig;
pub use error::SearchError;
pub use network::{Evaluation, Network, NetworkError, UniformNetwork};
pub use node::Node;
pub use search::{worker_pool, Mcts, SearchResult, SearchStats, StopHandle};
pub use tree::SearchTree;
