//! Captured-piece bookkeeping

use serde::{Serialize, Serializer};
use shakmaty::{Color, Role};

use crate::rules::{role_letter, PlayedMove};

/// Captured pieces, keyed by the color of the piece that was taken.
///
/// Lists are kept in display order: pawn, knight, bishop, rook, queen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapturedPieces {
    #[serde(rename = "w", serialize_with = "letters")]
    white: Vec<Role>,
    #[serde(rename = "b", serialize_with = "letters")]
    black: Vec<Role>,
}

impl CapturedPieces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full recompute from move metadata.
    pub fn from_history(history: &[PlayedMove]) -> Self {
        let mut captured = Self::new();
        for played in history {
            captured.record(played);
        }
        captured
    }

    /// Incremental update after one accepted move.
    pub fn record(&mut self, played: &PlayedMove) {
        if let Some(role) = played.captured {
            let list = self.list_mut(played.color.other());
            list.push(role);
            list.sort_by_key(|r| display_rank(*r));
        }
    }

    /// Pieces of `color` that have been captured.
    pub fn lost_by(&self, color: Color) -> &[Role] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// Opponent pieces captured by `color`.
    pub fn taken_by(&self, color: Color) -> &[Role] {
        self.lost_by(color.other())
    }

    pub fn is_empty(&self) -> bool {
        self.white.is_empty() && self.black.is_empty()
    }

    fn list_mut(&mut self, color: Color) -> &mut Vec<Role> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}

fn display_rank(role: Role) -> u8 {
    match role {
        Role::Pawn => 0,
        Role::Knight => 1,
        Role::Bishop => 2,
        Role::Rook => 3,
        Role::Queen => 4,
        Role::King => 5,
    }
}

fn letters<S: Serializer>(roles: &[Role], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(roles.iter().map(|r| role_letter(*r).to_string()))
}
