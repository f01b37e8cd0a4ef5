//! Move types shared by the rules adapter and the session core

use shakmaty::{Color, Role, Square};
use thiserror::Error;

/// A move as the board UI submits it: two squares and an optional promotion.
///
/// Castling is addressed by the king's destination square (e1g1, e8c8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl Candidate {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, role: Role) -> Self {
        self.promotion = Some(role);
        self
    }

    /// Parses squares like "e2"/"e4" and an optional promotion letter ("q").
    pub fn parse(from: &str, to: &str, promotion: Option<&str>) -> Option<Self> {
        let from: Square = from.trim().parse().ok()?;
        let to: Square = to.trim().parse().ok()?;
        let promotion = match promotion.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => {
                let mut chars = p.chars();
                let role = Role::from_char(chars.next()?.to_ascii_lowercase())?;
                if chars.next().is_some() {
                    return None;
                }
                Some(role)
            }
            None => None,
        };
        Some(Self { from, to, promotion })
    }
}

/// One ply of history with the metadata the session core needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    /// SAN including the check suffix, e.g. "Qxf7+".
    pub san: String,
    pub from: Square,
    /// Destination of the moving piece (the king's square for castling).
    pub to: Square,
    pub color: Color,
    pub role: Role,
    pub captured: Option<Role>,
    pub promotion: Option<Role>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The move is well formed but not legal in the position.
    #[error("illegal move: {0}")]
    Illegal(String),

    /// The move could not be read at all, or does not name a single move.
    #[error("malformed move: {0}")]
    Malformed(String),
}

/// Lowercase piece letter ("p", "n", "b", "r", "q", "k").
pub fn role_letter(role: Role) -> char {
    role.char()
}

pub fn color_letter(color: Color) -> char {
    match color {
        Color::White => 'w',
        Color::Black => 'b',
    }
}
