//! Move validation and application
//!
//! Rebuild-then-validate: every candidate is tried on a shadow game rebuilt
//! by replaying the accepted SAN history from the standard start. The shadow
//! only replaces the authoritative game once the rules engine accepts the
//! move, so a rejected move can never leave a half-applied position behind.

use shakmaty::Square;

use crate::rules::{Candidate, Game, MoveError, PlayedMove};

/// An accepted move: the advanced game plus the ply that got it there.
#[derive(Debug, Clone)]
pub struct AppliedMove {
    pub game: Game,
    pub played: PlayedMove,
}

impl AppliedMove {
    /// Squares to highlight as the last move.
    pub fn last_move(&self) -> (Square, Square) {
        (self.played.from, self.played.to)
    }
}

/// Tries `candidate` against `current`. `None` means rejected, nothing changed.
pub fn apply_move(current: &Game, candidate: Candidate) -> Option<AppliedMove> {
    if is_friendly_capture(current, candidate) {
        return None;
    }

    let mut shadow = match Game::from_sans(&current.sans()) {
        Ok(game) => game,
        Err((_, ply, e)) => {
            tracing::warn!("Accepted history failed to replay at ply {}: {}", ply, e);
            return None;
        }
    };

    let result = shadow.play(candidate).cloned();
    match result {
        Ok(played) => Some(AppliedMove {
            game: shadow,
            played,
        }),
        Err(MoveError::Illegal(_)) => None,
        Err(e @ MoveError::Malformed(_)) => {
            tracing::debug!("Rejected move: {}", e);
            None
        }
    }
}

/// Destination holds a piece of the mover's own color.
fn is_friendly_capture(game: &Game, candidate: Candidate) -> bool {
    match (game.piece_at(candidate.from), game.piece_at(candidate.to)) {
        (Some(moving), Some(target)) => moving.color == target.color,
        _ => false,
    }
}
