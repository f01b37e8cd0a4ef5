//! JSON views returned by the API

use chrono::{DateTime, Utc};
use serde::Serialize;
use shakmaty::{Color, Square};

use chess_play_core::session::{CapturedPieces, ClockValue, GameStatus, ReplayViewer};
use chess_play_core::storage::SavedGame;
use chess_play_core::SessionController;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGameView {
    pub id: i64,
    pub name: String,
    pub fen: String,
    pub moves: Vec<String>,
    pub white_time: Option<u32>,
    pub black_time: Option<u32>,
    pub is_timer_enabled: bool,
    pub is_game_over: bool,
    pub updated_at: String,
}

impl From<SavedGame> for SavedGameView {
    fn from(game: SavedGame) -> Self {
        Self {
            id: game.id,
            name: game.name,
            fen: game.fen,
            moves: game.moves,
            white_time: game.white_time,
            black_time: game.black_time,
            is_timer_enabled: game.is_timer_enabled,
            is_game_over: game.is_game_over,
            updated_at: rfc3339(game.updated_at),
        }
    }
}

fn rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct MoveSquares {
    pub from: String,
    pub to: String,
}

impl From<(Square, Square)> for MoveSquares {
    fn from((from, to): (Square, Square)) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockView {
    pub enabled: bool,
    pub running: bool,
    pub white: Option<u32>,
    pub black: Option<u32>,
    pub white_display: String,
    pub black_display: String,
}

impl ClockView {
    fn new(controller: &SessionController) -> Self {
        let clock = controller.clock();
        let white: ClockValue = clock.value(Color::White);
        let black: ClockValue = clock.value(Color::Black);
        Self {
            enabled: clock.is_timed(),
            running: clock.is_running(),
            white: white.seconds(),
            black: black.seconds(),
            white_display: white.display(),
            black_display: black.display(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub state: &'static str,
    pub fen: String,
    pub turn: &'static str,
    pub moves: Vec<String>,
    pub last_move: Option<MoveSquares>,
    pub status: GameStatus,
    pub message: Option<String>,
    pub clock: ClockView,
    pub captures: CapturedPieces,
    pub resumed_id: Option<i64>,
    pub saving: bool,
    pub save_error: Option<String>,
}

impl SessionView {
    pub fn new(id: &str, controller: &SessionController) -> Self {
        let status = controller.status();
        Self {
            id: id.to_string(),
            state: controller.state().as_str(),
            fen: controller.game().fen(),
            turn: color_name(controller.turn()),
            moves: controller.game().sans(),
            last_move: controller.last_move().map(MoveSquares::from),
            status,
            message: status.game_over.map(|reason| reason.to_string()),
            clock: ClockView::new(controller),
            captures: controller.captures().clone(),
            resumed_id: controller.resumed_id(),
            saving: controller.is_saving(),
            save_error: controller.save_error().map(String::from),
        }
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFrame {
    pub game_id: i64,
    pub name: String,
    pub cursor: isize,
    pub total: usize,
    pub label: String,
    pub fen: String,
    pub last_move: Option<MoveSquares>,
    pub at_start: bool,
    pub at_end: bool,
    pub moves: Vec<String>,
}

impl ReplayFrame {
    pub fn new(game: &SavedGame, viewer: &ReplayViewer) -> Self {
        Self {
            game_id: game.id,
            name: game.name.clone(),
            cursor: viewer.cursor(),
            total: viewer.total(),
            label: viewer.label(),
            fen: viewer.game().fen(),
            last_move: viewer.last_move().map(MoveSquares::from),
            at_start: viewer.at_start(),
            at_end: viewer.at_end(),
            moves: viewer.moves().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_play_core::{Candidate, TimeControl};

    #[test]
    fn test_updated_at_is_rfc3339() {
        assert_eq!(rfc3339(0), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_session_view() {
        let mut controller = SessionController::new();
        controller.start(TimeControl::timed(5)).unwrap();
        assert!(controller.try_move(Candidate::new(Square::E2, Square::E4)));

        let json = serde_json::to_value(SessionView::new("a1b2", &controller)).unwrap();
        assert_eq!(json["state"], "active");
        assert_eq!(json["turn"], "black");
        assert_eq!(json["moves"][0], "e4");
        assert_eq!(json["lastMove"]["to"], "e4");
        assert_eq!(json["clock"]["whiteDisplay"], "05:00");
        assert_eq!(json["status"]["gameOver"], serde_json::Value::Null);
        assert_eq!(json["captures"]["w"], serde_json::json!([]));
    }
}
