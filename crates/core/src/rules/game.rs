//! Game: a shakmaty position plus its history

use std::collections::HashMap;

use shakmaty::{
    fen::Fen,
    san::{San, SanError, SanPlus},
    Chess, Color, EnPassantMode, File, Move, Piece, Position, Role, Square,
};

use super::types::*;

const FIFTY_MOVE_HALFMOVES: u32 = 100;

#[derive(Debug, Clone)]
pub struct Game {
    position: Chess,
    history: Vec<PlayedMove>,
    seen: HashMap<String, u32>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Standard starting position, empty history.
    pub fn new() -> Self {
        let position = crate::starting_position();
        let mut seen = HashMap::new();
        seen.insert(repetition_key(&position), 1);
        Self {
            position,
            history: Vec::new(),
            seen,
        }
    }

    /// Replays SAN moves from the standard start, stopping at the first failure.
    pub fn from_sans<S: AsRef<str>>(sans: &[S]) -> Result<Self, (Self, usize, MoveError)> {
        let mut game = Self::new();
        for (ply, san) in sans.iter().enumerate() {
            let played = game.play_san(san.as_ref()).map(|_| ());
            if let Err(e) = played {
                return Err((game, ply, e));
            }
        }
        Ok(game)
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn history(&self) -> &[PlayedMove] {
        &self.history
    }

    pub fn sans(&self) -> Vec<String> {
        self.history.iter().map(|m| m.san.clone()).collect()
    }

    pub fn last_move(&self) -> Option<&PlayedMove> {
        self.history.last()
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.position.board().king_of(color)
    }

    /// Portable position string.
    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    /// Plays a move given in compact algebraic notation ("Nf3", "exd5", "O-O").
    pub fn play_san(&mut self, san: &str) -> Result<&PlayedMove, MoveError> {
        let parsed: SanPlus = san
            .trim()
            .parse()
            .map_err(|_| MoveError::Malformed(san.to_string()))?;

        let mv = match parsed.san.to_move(&self.position) {
            Ok(mv) => mv,
            Err(SanError::AmbiguousSan) => return Err(MoveError::Malformed(san.to_string())),
            Err(_) => return Err(MoveError::Illegal(san.to_string())),
        };

        Ok(self.commit(mv))
    }

    /// Plays a move given as squares plus optional promotion.
    pub fn play(&mut self, candidate: Candidate) -> Result<&PlayedMove, MoveError> {
        let describe = || {
            format!(
                "{}{}{}",
                candidate.from,
                candidate.to,
                candidate.promotion.map(|r| r.char().to_string()).unwrap_or_default()
            )
        };

        if candidate.from == candidate.to {
            return Err(MoveError::Malformed(describe()));
        }
        if matches!(candidate.promotion, Some(Role::Pawn) | Some(Role::King)) {
            return Err(MoveError::Malformed(describe()));
        }

        let mv = self
            .position
            .legal_moves()
            .iter()
            .find(|m| {
                m.from() == Some(candidate.from)
                    && destination(m) == candidate.to
                    && match m.promotion() {
                        Some(role) => candidate.promotion == Some(role),
                        None => true,
                    }
            })
            .cloned()
            .ok_or_else(|| MoveError::Illegal(describe()))?;

        Ok(self.commit(mv))
    }

    /// Destinations of the side to move's legal moves from `from`.
    pub fn legal_destinations(&self, from: Square) -> Vec<Square> {
        let mut squares: Vec<Square> = self
            .position
            .legal_moves()
            .iter()
            .filter(|m| m.from() == Some(from))
            .map(destination)
            .collect();
        squares.sort();
        squares.dedup();
        squares
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.position.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.position.is_insufficient_material()
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.seen
            .get(&repetition_key(&self.position))
            .is_some_and(|count| *count >= 3)
    }

    pub fn is_fifty_moves(&self) -> bool {
        self.position.halfmoves() >= FIFTY_MOVE_HALFMOVES
    }

    pub fn is_draw(&self) -> bool {
        self.is_stalemate()
            || self.is_insufficient_material()
            || self.is_threefold_repetition()
            || self.is_fifty_moves()
    }

    pub fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw() || self.position.is_variant_end()
    }

    fn commit(&mut self, mv: Move) -> &PlayedMove {
        let color = self.position.turn();
        let san = San::from_move(&self.position, mv.clone()).to_string();

        let from = mv.from().unwrap_or_else(|| mv.to());
        let played = PlayedMove {
            san: String::new(),
            from,
            to: destination(&mv),
            color,
            role: mv.role(),
            captured: mv.capture(),
            promotion: mv.promotion(),
        };

        self.position.play_unchecked(mv);

        let suffix = if self.position.is_checkmate() {
            "#"
        } else if self.position.is_check() {
            "+"
        } else {
            ""
        };

        *self.seen.entry(repetition_key(&self.position)).or_insert(0) += 1;
        self.history.push(PlayedMove {
            san: format!("{}{}", san, suffix),
            ..played
        });

        // just pushed
        &self.history[self.history.len() - 1]
    }
}

/// Where the moving piece lands. shakmaty encodes castling as king-takes-rook,
/// the board UI thinks in king squares.
fn destination(mv: &Move) -> Square {
    match mv {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            Square::from_coords(file, king.rank())
        }
        other => other.to(),
    }
}

/// FEN without the move counters: board, side to move, castling, en passant.
fn repetition_key(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal)
        .to_string()
        .split(' ')
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}
