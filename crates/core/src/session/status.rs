//! Game status evaluation
//!
//! Recomputed from scratch after every move and every clock tick. Rule
//! outcomes are checked before the clock, so a game that ended on the board
//! is never reported as a timeout.

use std::fmt;

use serde::{Serialize, Serializer};
use shakmaty::{Color, Square};

use super::clock::Clock;
use crate::rules::Game;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    Checkmate { winner: Color },
    Stalemate,
    ThreefoldRepetition,
    InsufficientMaterial,
    Draw,
    Timeout { winner: Color },
    /// The rules engine ended the game for a reason not listed above.
    Other,
}

impl GameOverReason {
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameOverReason::Checkmate { winner } | GameOverReason::Timeout { winner } => {
                Some(*winner)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameOverReason::Checkmate { .. } => "checkmate",
            GameOverReason::Stalemate => "stalemate",
            GameOverReason::ThreefoldRepetition => "threefold_repetition",
            GameOverReason::InsufficientMaterial => "insufficient_material",
            GameOverReason::Draw => "draw",
            GameOverReason::Timeout { .. } => "timeout",
            GameOverReason::Other => "other",
        }
    }
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOverReason::Checkmate { winner } => write!(f, "Checkmate! {} wins.", side_name(*winner)),
            GameOverReason::Stalemate => write!(f, "Stalemate! Draw."),
            GameOverReason::ThreefoldRepetition => write!(f, "Draw by Threefold Repetition."),
            GameOverReason::InsufficientMaterial => write!(f, "Draw by Insufficient Material."),
            GameOverReason::Draw => write!(f, "Draw."),
            GameOverReason::Timeout { winner } => write!(f, "Time's up! {} wins.", side_name(*winner)),
            GameOverReason::Other => write!(f, "Game Over!"),
        }
    }
}

impl Serialize for GameOverReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("GameOverReason", 3)?;
        state.serialize_field("kind", self.as_str())?;
        state.serialize_field("winner", &self.winner().map(side_name))?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub fn side_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    pub game_over: Option<GameOverReason>,
    #[serde(serialize_with = "square_name")]
    pub check_square: Option<Square>,
}

impl GameStatus {
    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }
}

fn square_name<S: Serializer>(square: &Option<Square>, serializer: S) -> Result<S::Ok, S::Error> {
    match square {
        Some(sq) => serializer.serialize_some(&sq.to_string()),
        None => serializer.serialize_none(),
    }
}

pub fn evaluate(game: &Game, clock: &Clock) -> GameStatus {
    if game.is_game_over() {
        let mover = game.turn();
        let (reason, check_square) = if game.is_checkmate() {
            (
                GameOverReason::Checkmate {
                    winner: mover.other(),
                },
                game.king_square(mover),
            )
        } else if game.is_stalemate() {
            (GameOverReason::Stalemate, None)
        } else if game.is_threefold_repetition() {
            (GameOverReason::ThreefoldRepetition, None)
        } else if game.is_insufficient_material() {
            (GameOverReason::InsufficientMaterial, None)
        } else if game.is_draw() {
            (GameOverReason::Draw, None)
        } else {
            (GameOverReason::Other, None)
        };
        return GameStatus {
            game_over: Some(reason),
            check_square,
        };
    }

    if clock.is_timed() {
        for side in [Color::White, Color::Black] {
            if clock.value(side).is_flagged() {
                return GameStatus {
                    game_over: Some(GameOverReason::Timeout {
                        winner: side.other(),
                    }),
                    check_square: None,
                };
            }
        }
    }

    GameStatus {
        game_over: None,
        check_square: if game.is_check() {
            game.king_square(game.turn())
        } else {
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::TimeControl;

    fn game(sans: &[&str]) -> Game {
        Game::from_sans(sans).unwrap()
    }

    #[test]
    fn test_ongoing_without_check() {
        let status = evaluate(&game(&["e4", "e5", "Qh5"]), &Clock::untimed());
        assert_eq!(status, GameStatus::default());
    }

    #[test]
    fn test_check_reports_king_square() {
        let status = evaluate(&game(&["e4", "e5", "Qh5", "Nc6", "Qxf7"]), &Clock::untimed());
        assert!(!status.is_game_over());
        assert_eq!(status.check_square, Some(Square::E8));
    }

    #[test]
    fn test_checkmate() {
        let g = game(&["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7"]);
        let status = evaluate(&g, &Clock::untimed());
        assert_eq!(
            status.game_over,
            Some(GameOverReason::Checkmate { winner: Color::White })
        );
        assert_eq!(status.check_square, Some(Square::E8));
        assert_eq!(status.game_over.unwrap().to_string(), "Checkmate! White wins.");
    }

    #[test]
    fn test_checkmate_beats_flagged_clock() {
        let g = game(&["f3", "e5", "g4", "Qh4"]);
        let clock = Clock::with_seconds(0, 0);
        let status = evaluate(&g, &clock);
        assert_eq!(
            status.game_over,
            Some(GameOverReason::Checkmate { winner: Color::Black })
        );
        assert_eq!(status.check_square, Some(Square::E1));
    }

    #[test]
    fn test_stalemate() {
        // Shortest known stalemate
        let g = game(&[
            "e3", "a5", "Qh5", "Ra6", "Qxa5", "h5", "h4", "Rah6", "Qxc7", "f6", "Qxd7+", "Kf7",
            "Qxb7", "Qd3", "Qxb8", "Qh7", "Qxc8", "Kg6", "Qe6",
        ]);
        let status = evaluate(&g, &Clock::untimed());
        assert_eq!(status.game_over, Some(GameOverReason::Stalemate));
        assert_eq!(status.check_square, None);
    }

    #[test]
    fn test_threefold_repetition() {
        let g = game(&["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8"]);
        let status = evaluate(&g, &Clock::untimed());
        assert_eq!(status.game_over, Some(GameOverReason::ThreefoldRepetition));
        assert_eq!(status.game_over.unwrap().to_string(), "Draw by Threefold Repetition.");
    }

    #[test]
    fn test_timeout_for_side_not_in_check() {
        let g = game(&["e4"]);
        let mut clock = Clock::with_seconds(300, 1);
        clock.set_running(true);
        clock.tick(g.turn());
        let status = evaluate(&g, &clock);
        assert_eq!(
            status.game_over,
            Some(GameOverReason::Timeout { winner: Color::White })
        );
        assert_eq!(status.game_over.unwrap().to_string(), "Time's up! White wins.");
    }

    #[test]
    fn test_untimed_clock_never_times_out() {
        let status = evaluate(&Game::new(), &Clock::new(TimeControl::Untimed));
        assert!(!status.is_game_over());
    }

    #[test]
    fn test_serialized_shape() {
        let g = game(&["f3", "e5", "g4", "Qh4"]);
        let json = serde_json::to_value(evaluate(&g, &Clock::untimed())).unwrap();
        assert_eq!(json["checkSquare"], "e1");
        assert_eq!(json["gameOver"]["kind"], "checkmate");
        assert_eq!(json["gameOver"]["winner"], "Black");
        assert_eq!(json["gameOver"]["message"], "Checkmate! Black wins.");
    }
}
