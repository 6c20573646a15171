use thiserror::Error;

/// Rule violations and malformed actions. Infrastructure failures (SQLite,
/// I/O) travel as `anyhow::Error` instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("unknown player color: {0}")]
    UnknownPlayer(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("action `{0}` needs canvas coordinates")]
    MissingCoordinates(String),

    #[error("{color} has no {resource} to give up")]
    InsufficientResource { color: String, resource: String },

    #[error("no development cards left to draw")]
    DeckEmpty,

    #[error("no development card draw to undo")]
    NothingToUndo,

    #[error("invalid table settings: {0}")]
    InvalidSettings(String),
}

impl GameError {
    /// Errors caused by the current table state rather than a bad request.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            GameError::InsufficientResource { .. } | GameError::DeckEmpty | GameError::NothingToUndo
        )
    }
}
