//! Gomoku environments for AlphaZero-style search.
//!
//! Two variants share one [`Board`] state and differ only in which cells
//! are playable:
//!
//! - [`Gomoku`] - free-style, any empty cell (15x15, five in a row)
//! - [`GravityGomoku`] - stones rest on the lowest empty cell of a column
//!   (15x15, four in a row)
//!
//! Both implement [`alphazero_core::Game`], so the search is generic over
//! the variant chosen when the environment is built.

mod board;
mod freestyle;
mod gravity;
pub mod observation;

pub use board::{Board, BoardSpec, MAX_BOARD_SIZE};
pub use freestyle::Gomoku;
pub use gravity::GravityGomoku;
