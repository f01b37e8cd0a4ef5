//! Chess Play Core Library
//!
//! Local two-player chess sessions: move application, clocks, game-over
//! detection, resume and replay, plus per-user saved games in SQLite.

use shakmaty::Chess;

pub mod error;
pub mod rules;
pub mod session;
pub mod storage;

pub use error::{Error, Result};
pub use rules::{Candidate, Game, MoveError, PlayedMove};
pub use session::{SessionController, SessionState, TimeControl};
pub use storage::{Database, GameStore};

/// Creates the standard starting position
pub fn starting_position() -> Chess {
    Chess::default()
}
