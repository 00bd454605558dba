//! Error types for the game simulation.
//!
//! Gameplay itself never fails: repair levels and timers are clamped, not
//! rejected. Errors only arise from bad configuration at session start and
//! from callers naming entities that do not exist.

use thiserror::Error;

use crate::components::EntityRef;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// The session configuration or factory layout is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityRef),

    /// Scenario text could not be parsed.
    #[error("Failed to parse scenario: {0}")]
    ScenarioParse(String),
}

impl From<ron::error::SpannedError> for GameError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::ScenarioParse(err.to_string())
    }
}
