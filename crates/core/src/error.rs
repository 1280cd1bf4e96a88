use thiserror::Error;

/// Errors raised by game environments and typed search outputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlphaZeroError {
    #[error("action {action} is out of bounds (num_actions = {num_actions})")]
    ActionOutOfBounds { action: usize, num_actions: usize },

    #[error("illegal action {action}: {reason}")]
    IllegalAction { action: usize, reason: &'static str },

    #[error("game is already over")]
    GameOver,

    #[error("no legal actions in a non-terminal state")]
    NoLegalActions,

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AlphaZeroError {
    /// True for the errors a caller triggers by asking for a move the
    /// environment cannot play.
    pub fn is_invalid_action(&self) -> bool {
        matches!(
            self,
            Self::ActionOutOfBounds { .. } | Self::IllegalAction { .. } | Self::GameOver
        )
    }
}

/// Convenience Result type for environment operations
pub type Result<T> = std::result::Result<T, AlphaZeroError>;
