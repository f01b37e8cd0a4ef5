//! Error types for chess-play-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Never says which of the two it was.
    #[error("Game not found or not authorized")]
    NotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error("You must be logged in to save games.")]
    Unauthenticated,

    #[error("Invalid session state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
