use crate::{Outcome, Player, Result};

/// Capability interface every board game variant exposes to the search.
///
/// Actions are flat indices in `0..num_actions()`, so the policy vector and
/// the action space line up one to one. States are immutable: `apply`
/// returns the successor and leaves its input untouched, which lets many
/// search workers walk the same tree from a shared root state.
pub trait Game: Send + Sync {
    /// The game state (board, side to move, move history)
    type State: Clone + PartialEq + Send + Sync;

    /// Returns the initial game state
    fn initial_state(&self) -> Self::State;

    /// Returns all legal actions from the given state, in ascending order
    fn legal_actions(&self, state: &Self::State) -> Vec<usize>;

    /// Applies an action, returning a new state.
    ///
    /// # Errors
    /// `ActionOutOfBounds` when `action >= num_actions()`, `IllegalAction`
    /// when the action is not legal in `state`, and `GameOver` when the
    /// state is already terminal.
    fn apply(&self, state: &Self::State, action: usize) -> Result<Self::State>;

    /// Returns true if the game has ended
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Returns the game outcome from the perspective of the player who just
    /// moved, or `None` if the game is not terminal.
    fn outcome(&self, state: &Self::State) -> Option<Outcome>;

    /// The player whose turn it is in `state`
    fn current_player(&self, state: &Self::State) -> Player;

    /// Encodes the state as network input, laid out as `observation_shape()`
    fn encode(&self, state: &Self::State) -> Vec<f32>;

    /// Shape of the encoded observation as `[planes, rows, cols]`
    fn observation_shape(&self) -> [usize; 3];

    /// Total number of action indices (size of the policy vector)
    fn num_actions(&self) -> usize;

    /// Value of a terminal state for the player to move there.
    ///
    /// The player to move at a terminal state is the opponent of the player
    /// who just moved, so the outcome is negated.
    fn terminal_value(&self, state: &Self::State) -> Option<f32> {
        self.outcome(state).map(|outcome| outcome.flip().value())
    }
}
