//! Error types for game operations.

use thiserror::Error;

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;

/// Errors that can occur in game operations.
#[derive(Debug, Error)]
pub enum GameError {
    /// Shape not found in the scene.
    #[error("Shape not found: {0}")]
    ShapeNotFound(String),

    /// The referenced movement does not exist in the catalog.
    #[error("Unknown movement: {0}")]
    UnknownMovement(String),

    /// The movement requires a higher level than the user has.
    #[error("Movement locked: requires level {required}, user is level {level}")]
    MovementLocked {
        /// Level required to unlock the movement.
        required: u32,
        /// The user's current level.
        level: u32,
    },

    /// A save was attempted with nothing drawn.
    #[error("Drawing is empty")]
    EmptyDrawing,

    /// The referenced user does not exist.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// Advisory scoring is temporarily unavailable.
    #[error("Scoring unavailable: {0}")]
    ScoringUnavailable(String),

    /// Scene serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
