//! Tutor error types

use thiserror::Error;

/// Errors surfaced to the caller. None of them changes session state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TutorError {
    #[error("No game in progress. Start a new game first.")]
    NoSession,

    #[error("Malformed move: {0}")]
    MalformedMove(String),

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("The game is over. Start a new game to keep playing.")]
    GameOver,

    #[error("No pending move matches {0}")]
    InvalidConfirmation(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}
