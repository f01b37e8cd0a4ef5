//! Rules engine adapter over shakmaty
//!
//! shakmaty positions carry no history, so [`Game`] keeps the SAN move list,
//! per-ply metadata and repetition counts next to the current position.

mod game;
mod types;

pub use game::Game;
pub use types::*;
