//! AlphaZero Core - Game abstractions and common types
//!
//! This crate provides the `Game` capability trait that board game variants
//! implement so the search engine can drive them without knowing their rules.
//!
//! # Types
//!
//! - [`Game`] - Trait for game implementations
//! - [`Player`] - Black or white, black moves first
//! - [`Outcome`] - Win, loss or draw of a finished game
//! - [`Policy`] - Probability distribution over actions (sums to 1.0)
//! - [`Value`] - Game value estimate in [-1, 1]

mod error;
mod game;
mod types;

pub use error::{AlphaZeroError, Result};
pub use game::Game;
pub use types::{Outcome, Player, Policy, Value, POLICY_SUM_TOLERANCE};
