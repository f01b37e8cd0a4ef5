//! Resuming a saved session from its move list

use serde::Deserialize;

use super::captures::CapturedPieces;
use crate::rules::Game;

/// Named parameters carried by the request that resumes a saved game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeParams {
    pub game_id: i64,
    #[serde(default)]
    pub fen: String,
    /// Comma-joined SAN list.
    #[serde(default)]
    pub moves: String,
    #[serde(default)]
    pub is_timer_enabled: bool,
    pub white_time: Option<u32>,
    pub black_time: Option<u32>,
}

impl ResumeParams {
    pub fn move_list(&self) -> Vec<String> {
        split_moves(&self.moves)
    }
}

pub fn split_moves(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

/// Result of replaying stored history.
#[derive(Debug, Clone)]
pub struct Replayed {
    pub game: Game,
    pub captures: CapturedPieces,
    /// Some stored moves were dropped because they no longer replay.
    pub truncated: bool,
}

/// Replays `moves` from the standard start. A move that fails to apply ends
/// the replay there; the game keeps every move before it.
pub fn replay_history<S: AsRef<str>>(moves: &[S]) -> Replayed {
    let (game, truncated) = match Game::from_sans(moves) {
        Ok(game) => (game, false),
        Err((game, ply, e)) => {
            tracing::warn!(
                "Stored history stops replaying at ply {} of {}: {}",
                ply,
                moves.len(),
                e
            );
            (game, true)
        }
    };
    let captures = CapturedPieces::from_history(game.history());
    Replayed {
        game,
        captures,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{Color, Role};

    #[test]
    fn test_split_moves() {
        assert_eq!(split_moves("e4,e5, Nf3,"), vec!["e4", "e5", "Nf3"]);
        assert!(split_moves("").is_empty());
    }

    #[test]
    fn test_full_replay() {
        let replayed = replay_history(&["e4", "d5", "exd5"]);
        assert!(!replayed.truncated);
        assert_eq!(replayed.game.history().len(), 3);
        assert_eq!(replayed.captures.taken_by(Color::White), &[Role::Pawn]);
    }

    #[test]
    fn test_truncates_at_illegal_trailing_move() {
        let replayed = replay_history(&["e4", "e5", "Qh5", "Qh5"]);
        assert!(replayed.truncated);
        assert_eq!(replayed.game.sans(), vec!["e4", "e5", "Qh5"]);
        assert_eq!(replayed.game.turn(), Color::Black);
    }

    #[test]
    fn test_truncates_at_garbage() {
        let replayed = replay_history(&["e4", "??", "e5"]);
        assert!(replayed.truncated);
        assert_eq!(replayed.game.sans(), vec!["e4"]);
    }

    #[test]
    fn test_params_from_query() {
        let params: ResumeParams = serde_json::from_value(serde_json::json!({
            "gameId": 7,
            "fen": "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            "moves": "e4",
            "isTimerEnabled": true,
            "whiteTime": 290,
            "blackTime": 300
        }))
        .unwrap();
        assert_eq!(params.game_id, 7);
        assert_eq!(params.move_list(), vec!["e4"]);
        assert!(params.is_timer_enabled);
        assert_eq!(params.white_time, Some(290));
    }
}
