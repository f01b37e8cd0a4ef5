//! Read-only move-by-move review of a saved game
//!
//! Every cursor change replays moves `0..=cursor` from the standard start.
//! Games are a few hundred plies at most, so there is no incremental undo.

use shakmaty::Square;

use crate::rules::Game;

/// Cursor value for the initial position.
pub const INITIAL: isize = -1;

#[derive(Debug, Clone)]
pub struct ReplayViewer {
    moves: Vec<String>,
    cursor: isize,
    game: Game,
}

impl ReplayViewer {
    /// Opens at the final position.
    pub fn new(moves: Vec<String>) -> Self {
        let end = moves.len() as isize - 1;
        let mut viewer = Self {
            moves,
            cursor: INITIAL,
            game: Game::new(),
        };
        viewer.seek(end);
        viewer
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.moves.len()
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn at_start(&self) -> bool {
        self.cursor == INITIAL
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.last_index()
    }

    /// Moves the cursor, clamped to `-1..=last`, and rebuilds the position.
    pub fn seek(&mut self, index: isize) {
        self.cursor = index.clamp(INITIAL, self.last_index().max(INITIAL));
        self.game = rebuild(&self.moves, self.cursor);
    }

    pub fn forward(&mut self) {
        self.seek(self.cursor + 1);
    }

    pub fn back(&mut self) {
        self.seek(self.cursor - 1);
    }

    pub fn to_start(&mut self) {
        self.seek(INITIAL);
    }

    pub fn to_end(&mut self) {
        self.seek(self.last_index());
    }

    /// Squares of the move that produced the shown position.
    pub fn last_move(&self) -> Option<(Square, Square)> {
        if self.at_start() {
            return None;
        }
        self.game.last_move().map(|m| (m.from, m.to))
    }

    /// "Initial Position" or "(n/total)".
    pub fn label(&self) -> String {
        if self.at_start() {
            "Initial Position".to_string()
        } else {
            format!("({}/{})", self.cursor + 1, self.total())
        }
    }

    fn last_index(&self) -> isize {
        self.moves.len() as isize - 1
    }
}

fn rebuild(moves: &[String], cursor: isize) -> Game {
    let upto = (cursor + 1).max(0) as usize;
    match Game::from_sans(&moves[..upto.min(moves.len())]) {
        Ok(game) => game,
        Err((game, ply, e)) => {
            tracing::warn!("Replay stopped at ply {}: {}", ply, e);
            game
        }
    }
}
