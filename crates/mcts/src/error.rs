use crate::network::NetworkError;
use alphazero_core::AlphaZeroError;
use thiserror::Error;

/// Errors that abort a search.
///
/// Failed leaf evaluations are not errors: the simulation is dropped and
/// counted in `SearchStats::dropped`. Only a failure to evaluate the root,
/// which leaves nothing to search, is surfaced here.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The environment rejected an action or the configuration is invalid.
    #[error(transparent)]
    Game(#[from] AlphaZeroError),

    #[error("root evaluation failed: {0}")]
    Evaluation(#[from] NetworkError),

    #[error("simulation budget is zero for a non-terminal root")]
    ZeroBudget,

    /// The search ended without backing up a single simulation, because it
    /// was cancelled before its first batch or every leaf evaluation failed.
    #[error("search backed up no simulations (dropped: {dropped}, cancelled: {cancelled})")]
    NoSimulations { dropped: u32, cancelled: bool },

    #[error("failed to start search workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SearchError {
    /// True when the search failed because an action was out of bounds or
    /// illegal in the position it was applied to.
    pub fn is_invalid_action(&self) -> bool {
        matches!(self, Self::Game(e) if e.is_invalid_action())
    }
}
