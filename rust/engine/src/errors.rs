use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl GameError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, GameError::InvalidInput(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, GameError::InvalidState(_))
    }
}

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Failed to read deck file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse deck: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Deck has no playable cards after the header")]
    Empty,
    #[error("Invalid card at index {index}: {reason}")]
    InvalidCard { index: usize, reason: String },
}
