//! Session lifecycle controller
//!
//! Owns one game from setup to its terminal state:
//!
//! ```text
//! Setup --start/resume--> Active --quit--> Terminal(Quit)
//!                           |
//!                           +--save--> Terminal(Saved)
//! ```
//!
//! Callers hold the controller and drive it with discrete events: a move
//! attempt, a one-second tick, a prompt action or the result of a save.
//! Interested parties register listeners instead of polling shared flags.

use std::fmt;

use shakmaty::{Color, Square};

use super::applier::apply_move;
use super::captures::CapturedPieces;
use super::clock::{Clock, TimeControl};
use super::prompt::{ConfirmationPrompt, SessionAction};
use super::resume::{replay_history, ResumeParams};
use super::status::{evaluate, GameOverReason, GameStatus};
use crate::error::{Error, Result};
use crate::rules::{Candidate, Game};
use crate::storage::{GameSnapshot, GameStore, GameUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Quit,
    Saved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Setup,
    Active,
    Terminal(TerminalKind),
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Setup => "setup",
            SessionState::Active => "active",
            SessionState::Terminal(TerminalKind::Quit) => "quit",
            SessionState::Terminal(TerminalKind::Saved) => "saved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started { control: TimeControl },
    Resumed { game_id: i64, truncated: bool },
    MoveApplied { san: String },
    GameOver(GameOverReason),
    ClockStarted,
    ClockStopped,
    SaveFailed(String),
    Ended(TerminalKind),
}

pub type Listener = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// Where a save goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    Create,
    Update(i64),
}

/// A save that has been started but not yet finished. Run it against a
/// store with [`SaveRequest::execute`] and hand the result back to
/// [`SessionController::finish_save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub user: String,
    pub target: SaveTarget,
    pub snapshot: GameSnapshot,
}

impl SaveRequest {
    pub fn execute<S: GameStore + ?Sized>(&self, store: &S) -> Result<i64> {
        match self.target {
            SaveTarget::Create => store.create_game(&self.user, &self.snapshot),
            SaveTarget::Update(id) => store
                .update_game(&self.user, id, &GameUpdate::from(&self.snapshot))
                .map(|_| id),
        }
    }
}

pub struct SessionController {
    state: SessionState,
    game: Game,
    clock: Clock,
    captures: CapturedPieces,
    status: GameStatus,
    last_move: Option<(Square, Square)>,
    /// Saved-game id this session was resumed from.
    resumed_id: Option<i64>,
    saving: bool,
    save_error: Option<String>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("fen", &self.game.fen())
            .field("clock", &self.clock)
            .field("status", &self.status)
            .field("resumed_id", &self.resumed_id)
            .field("saving", &self.saving)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Setup,
            game: Game::new(),
            clock: Clock::untimed(),
            captures: CapturedPieces::new(),
            status: GameStatus::default(),
            last_move: None,
            resumed_id: None,
            saving: false,
            save_error: None,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn captures(&self) -> &CapturedPieces {
        &self.captures
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.last_move
    }

    pub fn resumed_id(&self) -> Option<i64> {
        self.resumed_id
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    pub fn clock_running(&self) -> bool {
        self.clock.is_running()
    }

    /// New game from the standard start.
    pub fn start(&mut self, control: TimeControl) -> Result<()> {
        self.ensure_can_begin()?;
        self.reset(Game::new(), Clock::new(control), CapturedPieces::new(), None);
        tracing::info!("Started {:?} game", control);
        self.emit(SessionEvent::Started { control });
        self.enter_active();
        Ok(())
    }

    /// Rebuilds a stored session and skips setup. History that no longer
    /// replays is truncated, never reported as an error.
    pub fn resume(&mut self, params: &ResumeParams) -> Result<()> {
        self.ensure_can_begin()?;

        let replayed = replay_history(&params.move_list());
        let clock = match (params.is_timer_enabled, params.white_time, params.black_time) {
            (true, Some(white), Some(black)) => Clock::with_seconds(white, black),
            (true, _, _) => {
                tracing::warn!(
                    "Game {} is timed but has no clock values; resuming untimed",
                    params.game_id
                );
                Clock::untimed()
            }
            (false, _, _) => Clock::untimed(),
        };

        let last_move = replayed.game.last_move().map(|m| (m.from, m.to));
        self.reset(replayed.game, clock, replayed.captures, Some(params.game_id));
        self.last_move = last_move;

        tracing::info!(
            "Resumed game {} at ply {}",
            params.game_id,
            self.game.history().len()
        );
        self.emit(SessionEvent::Resumed {
            game_id: params.game_id,
            truncated: replayed.truncated,
        });
        self.enter_active();
        Ok(())
    }

    /// Checks that `user` owns the referenced game and that it is still
    /// playable before resuming it.
    pub fn resume_saved<S: GameStore + ?Sized>(
        &mut self,
        store: &S,
        user: &str,
        params: &ResumeParams,
    ) -> Result<()> {
        let saved = store.get_game(user, params.game_id)?;
        if saved.is_game_over {
            return Err(Error::InvalidState("Cannot resume a finished game."));
        }
        self.resume(params)
    }

    /// Attempts a move. Returns false when rejected; nothing changes then.
    pub fn try_move(&mut self, candidate: Candidate) -> bool {
        if !self.is_active() || self.status.is_game_over() {
            return false;
        }

        let applied = match apply_move(&self.game, candidate) {
            Some(applied) => applied,
            None => return false,
        };

        self.captures.record(&applied.played);
        self.last_move = Some(applied.last_move());
        let san = applied.played.san.clone();
        self.game = applied.game;

        self.emit(SessionEvent::MoveApplied { san });
        self.refresh();
        true
    }

    /// Destinations for the piece on `from`, empty unless it belongs to the
    /// side on move in a live game.
    pub fn legal_destinations(&self, from: Square) -> Vec<Square> {
        if !self.is_active() || self.status.is_game_over() {
            return Vec::new();
        }
        self.game.legal_destinations(from)
    }

    pub fn turn(&self) -> Color {
        self.game.turn()
    }

    /// One second for the side on move. Returns false when the clock is not
    /// running.
    pub fn tick(&mut self) -> bool {
        if !self.is_active() || !self.clock.tick(self.game.turn()) {
            return false;
        }
        self.refresh();
        true
    }

    /// Recomputes status from scratch and reconciles the clock with it.
    pub fn refresh(&mut self) {
        let was_over = self.status.is_game_over();
        self.status = evaluate(&self.game, &self.clock);

        if let (false, Some(reason)) = (was_over, self.status.game_over) {
            tracing::info!("Game over: {}", reason);
            self.emit(SessionEvent::GameOver(reason));
        }
        self.sync_clock();
    }

    pub fn quit_prompt(&self, signed_in: bool) -> ConfirmationPrompt {
        ConfirmationPrompt::quit(signed_in)
    }

    pub fn leave_prompt(&self, signed_in: bool) -> ConfirmationPrompt {
        ConfirmationPrompt::leave(signed_in)
    }

    /// Carries out a prompt action.
    pub fn perform<S: GameStore + ?Sized>(
        &mut self,
        action: SessionAction,
        store: &S,
        user: Option<&str>,
    ) -> Result<()> {
        match action {
            SessionAction::Cancel => Ok(()),
            SessionAction::QuitWithoutSaving => {
                if self.quit_without_saving() {
                    Ok(())
                } else {
                    Err(Error::InvalidState("No active game to quit"))
                }
            }
            SessionAction::SaveAndQuit => self.save_and_quit(store, user).map(|_| ()),
        }
    }

    /// Discards the game. Ignored while a save is in flight.
    pub fn quit_without_saving(&mut self) -> bool {
        if !self.is_active() || self.saving {
            return false;
        }
        self.end(TerminalKind::Quit);
        self.reset(Game::new(), Clock::untimed(), CapturedPieces::new(), None);
        true
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            fen: self.game.fen(),
            moves: self.game.sans(),
            white_time: self.clock.value(Color::White).seconds(),
            black_time: self.clock.value(Color::Black).seconds(),
            is_timer_enabled: self.clock.is_timed(),
            is_game_over: self.status.is_game_over(),
        }
    }

    /// Starts a save. `Ok(None)` means one is already in flight and this
    /// request was ignored.
    pub fn begin_save(&mut self, user: Option<&str>) -> Result<Option<SaveRequest>> {
        if !self.is_active() {
            return Err(Error::InvalidState("No active game to save"));
        }
        if self.saving {
            tracing::debug!("Save already in progress, ignoring request");
            return Ok(None);
        }

        let user = match user {
            Some(user) => user,
            None => {
                let message = Error::Unauthenticated.to_string();
                self.save_error = Some(message.clone());
                self.emit(SessionEvent::SaveFailed(message));
                return Err(Error::Unauthenticated);
            }
        };

        self.saving = true;
        self.save_error = None;
        Ok(Some(SaveRequest {
            user: user.to_string(),
            target: self
                .resumed_id
                .map_or(SaveTarget::Create, SaveTarget::Update),
            snapshot: self.snapshot(),
        }))
    }

    /// Applies the outcome of a save started with [`Self::begin_save`].
    /// Success ends the session; failure keeps it active for a retry.
    pub fn finish_save(&mut self, result: Result<i64>) -> Result<i64> {
        self.saving = false;

        if !self.is_active() {
            tracing::debug!("Session ended before the save completed");
            return result;
        }

        match result {
            Ok(id) => {
                tracing::info!("Saved game {}", id);
                self.resumed_id = None;
                self.end(TerminalKind::Saved);
                Ok(id)
            }
            Err(e) => {
                tracing::warn!("Save failed: {}", e);
                let message = e.to_string();
                self.save_error = Some(message.clone());
                self.emit(SessionEvent::SaveFailed(message));
                Err(e)
            }
        }
    }

    /// Saves and ends the session in one step. `Ok(None)` means a save was
    /// already in flight.
    pub fn save_and_quit<S: GameStore + ?Sized>(
        &mut self,
        store: &S,
        user: Option<&str>,
    ) -> Result<Option<i64>> {
        let request = match self.begin_save(user)? {
            Some(request) => request,
            None => return Ok(None),
        };
        let result = request.execute(store);
        self.finish_save(result).map(Some)
    }

    fn ensure_can_begin(&self) -> Result<()> {
        match self.state {
            SessionState::Setup | SessionState::Terminal(_) => Ok(()),
            SessionState::Active => Err(Error::InvalidState("A game is already in progress")),
        }
    }

    fn reset(&mut self, game: Game, clock: Clock, captures: CapturedPieces, resumed_id: Option<i64>) {
        self.game = game;
        self.clock = clock;
        self.captures = captures;
        self.status = GameStatus::default();
        self.last_move = None;
        self.resumed_id = resumed_id;
        self.saving = false;
        self.save_error = None;
    }

    fn enter_active(&mut self) {
        self.state = SessionState::Active;
        self.refresh();
    }

    fn end(&mut self, kind: TerminalKind) {
        self.state = SessionState::Terminal(kind);
        self.sync_clock();
        self.emit(SessionEvent::Ended(kind));
    }

    /// Running iff active, timed and not over.
    fn sync_clock(&mut self) {
        let was_running = self.clock.is_running();
        let should_run = self.is_active() && !self.status.is_game_over();
        self.clock.set_running(should_run);

        match (was_running, self.clock.is_running()) {
            (false, true) => self.emit(SessionEvent::ClockStarted),
            (true, false) => self.emit(SessionEvent::ClockStopped),
            _ => {}
        }
    }

    fn emit(&self, event: SessionEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, SavedGame};
    use shakmaty::{Role, Square};
    use std::sync::{Arc, Mutex};

    fn play(session: &mut SessionController, from: Square, to: Square) -> bool {
        session.try_move(Candidate::new(from, to))
    }

    fn started() -> SessionController {
        let mut session = SessionController::new();
        session.start(TimeControl::Untimed).unwrap();
        session
    }

    fn resume_params(moves: &str) -> ResumeParams {
        ResumeParams {
            game_id: 1,
            fen: String::new(),
            moves: moves.to_string(),
            is_timer_enabled: false,
            white_time: None,
            black_time: None,
        }
    }

    struct FailingStore;

    impl GameStore for FailingStore {
        fn create_game(&self, _: &str, _: &GameSnapshot) -> Result<i64> {
            Err(Error::InvalidInput("Failed to save game".to_string()))
        }
        fn update_game(&self, _: &str, _: i64, _: &GameUpdate) -> Result<()> {
            Err(Error::NotFound)
        }
        fn get_game(&self, _: &str, _: i64) -> Result<SavedGame> {
            Err(Error::NotFound)
        }
        fn list_games(&self, _: &str) -> Result<Vec<SavedGame>> {
            Ok(Vec::new())
        }
        fn delete_game(&self, _: &str, _: i64) -> Result<()> {
            Err(Error::NotFound)
        }
    }

    #[test]
    fn test_new_game() {
        let session = started();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.game().fen(), Game::new().fen());
        assert!(session.captures().is_empty());
        assert!(!session.clock_running());
        assert_eq!(session.snapshot().white_time, None);
    }

    #[test]
    fn test_timed_game_runs_clock() {
        let mut session = SessionController::new();
        session.start(TimeControl::timed(5)).unwrap();
        assert!(session.clock_running());
        assert!(session.tick());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.white_time, Some(299));
        assert_eq!(snapshot.black_time, Some(300));
        assert!(snapshot.is_timer_enabled);
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut session = started();
        assert!(matches!(
            session.start(TimeControl::Untimed),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_queen_out() {
        let mut session = started();
        assert!(play(&mut session, Square::E2, Square::E4));
        assert!(play(&mut session, Square::E7, Square::E5));
        assert!(play(&mut session, Square::D1, Square::H5));

        assert_eq!(
            session.game().piece_at(Square::H5).map(|p| p.role),
            Some(Role::Queen)
        );
        assert_eq!(session.turn(), Color::Black);
        assert_eq!(session.status(), GameStatus::default());
        assert!(session.captures().is_empty());
        assert_eq!(session.last_move(), Some((Square::D1, Square::H5)));
    }

    #[test]
    fn test_king_escapes_queen_check() {
        let mut session = started();
        for (from, to) in [
            (Square::E2, Square::E4),
            (Square::E7, Square::E5),
            (Square::D1, Square::H5),
            (Square::B8, Square::C6),
            (Square::H5, Square::F7),
        ] {
            assert!(play(&mut session, from, to));
        }
        assert_eq!(session.captures().taken_by(Color::White), &[Role::Pawn]);
        assert_eq!(session.status().check_square, Some(Square::E8));

        // e7 is covered by the queen
        assert!(!play(&mut session, Square::E8, Square::E7));
        assert_eq!(session.game().history().len(), 5);

        assert!(play(&mut session, Square::E8, Square::F7));
        let status = session.status();
        assert!(!status.is_game_over());
        assert_eq!(status.check_square, None);
        assert_eq!(session.captures().taken_by(Color::Black), &[Role::Queen]);
    }

    #[test]
    fn test_checkmate_ends_game() {
        let mut session = started();
        for (from, to) in [
            (Square::F2, Square::F3),
            (Square::E7, Square::E5),
            (Square::G2, Square::G4),
            (Square::D8, Square::H4),
        ] {
            assert!(play(&mut session, from, to));
        }
        let status = session.status();
        assert_eq!(
            status.game_over,
            Some(GameOverReason::Checkmate { winner: Color::Black })
        );
        assert_eq!(status.check_square, Some(Square::E1));
        assert!(!play(&mut session, Square::E1, Square::F2));
        assert!(session.legal_destinations(Square::A2).is_empty());
        assert!(session.snapshot().is_game_over);
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let mut session = started();
        let before = session.game().fen();
        assert!(!play(&mut session, Square::D1, Square::D2));
        assert!(!play(&mut session, Square::E2, Square::E5));
        assert!(!play(&mut session, Square::E7, Square::E5));
        assert_eq!(session.game().fen(), before);
        assert_eq!(session.last_move(), None);
    }

    #[test]
    fn test_timeout() {
        let mut session = SessionController::new();
        let mut params = resume_params("");
        params.is_timer_enabled = true;
        params.white_time = Some(1);
        params.black_time = Some(60);
        session.resume(&params).unwrap();

        assert!(session.tick());
        assert_eq!(
            session.status().game_over,
            Some(GameOverReason::Timeout { winner: Color::Black })
        );
        assert!(!session.clock_running());
        assert!(!session.tick());
        assert_eq!(session.snapshot().black_time, Some(60));
    }

    #[test]
    fn test_resume_truncates_bad_history() {
        let mut session = SessionController::new();
        session.resume(&resume_params("e4,e5,Qh5,Qh5")).unwrap();
        assert!(session.is_active());
        assert_eq!(session.game().sans(), vec!["e4", "e5", "Qh5"]);
        assert_eq!(session.last_move(), Some((Square::D1, Square::H5)));
        assert_eq!(session.resumed_id(), Some(1));
    }

    #[test]
    fn test_resume_saved_checks_owner() {
        let db = Database::open_in_memory().unwrap();
        let mut snapshot = started().snapshot();
        let id = db.create_game("alice", &snapshot).unwrap();

        let mut params = resume_params("");
        params.game_id = id;

        let mut session = SessionController::new();
        assert!(matches!(
            session.resume_saved(&db, "mallory", &params),
            Err(Error::NotFound)
        ));
        assert_eq!(session.state(), SessionState::Setup);
        session.resume_saved(&db, "alice", &params).unwrap();

        snapshot.is_game_over = true;
        let finished = db.create_game("alice", &snapshot).unwrap();
        params.game_id = finished;
        let mut other = SessionController::new();
        assert!(matches!(
            other.resume_saved(&db, "alice", &params),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_unauthenticated_save_stays_active() {
        let db = Database::open_in_memory().unwrap();
        let mut session = started();
        assert!(play(&mut session, Square::E2, Square::E4));

        let err = session.save_and_quit(&db, None).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated));
        assert!(session.is_active());
        assert_eq!(session.save_error(), Some("You must be logged in to save games."));
        assert!(db.list_games("alice").unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_then_ends() {
        let db = Database::open_in_memory().unwrap();
        let mut session = started();
        assert!(play(&mut session, Square::E2, Square::E4));

        let id = session.save_and_quit(&db, Some("alice")).unwrap().unwrap();
        assert_eq!(session.state(), SessionState::Terminal(TerminalKind::Saved));

        let saved = db.get_game("alice", id).unwrap();
        assert_eq!(saved.moves, vec!["e4"]);
        assert_eq!(saved.white_time, None);
        assert!(!saved.is_timer_enabled);
    }

    #[test]
    fn test_resumed_save_updates_record() {
        let db = Database::open_in_memory().unwrap();
        let mut first = started();
        assert!(play(&mut first, Square::E2, Square::E4));
        let id = first.save_and_quit(&db, Some("alice")).unwrap().unwrap();

        let mut params = resume_params("e4");
        params.game_id = id;
        let mut session = SessionController::new();
        session.resume_saved(&db, "alice", &params).unwrap();
        assert!(play(&mut session, Square::E7, Square::E5));

        assert_eq!(session.save_and_quit(&db, Some("alice")).unwrap(), Some(id));
        assert_eq!(db.list_games("alice").unwrap().len(), 1);
        assert_eq!(db.get_game("alice", id).unwrap().moves, vec!["e4", "e5"]);
    }

    #[test]
    fn test_failed_save_allows_retry() {
        let db = Database::open_in_memory().unwrap();
        let mut session = started();
        assert!(play(&mut session, Square::E2, Square::E4));

        assert!(session.save_and_quit(&FailingStore, Some("alice")).is_err());
        assert!(session.is_active());
        assert!(!session.is_saving());
        assert_eq!(session.save_error(), Some("Failed to save game"));

        assert!(session.save_and_quit(&db, Some("alice")).unwrap().is_some());
        assert_eq!(session.save_error(), None);
    }

    #[test]
    fn test_save_in_flight_ignores_second_request() {
        let mut session = started();
        let request = session.begin_save(Some("alice")).unwrap();
        assert_eq!(request.map(|r| r.target), Some(SaveTarget::Create));
        assert!(session.begin_save(Some("alice")).unwrap().is_none());
        assert!(!session.quit_without_saving());

        session.finish_save(Ok(3)).unwrap();
        assert_eq!(session.state(), SessionState::Terminal(TerminalKind::Saved));
    }

    #[test]
    fn test_quit_and_start_again() {
        let db = Database::open_in_memory().unwrap();
        let mut session = started();
        assert!(play(&mut session, Square::E2, Square::E4));

        session
            .perform(SessionAction::Cancel, &db, None)
            .unwrap();
        assert!(session.is_active());

        session
            .perform(SessionAction::QuitWithoutSaving, &db, None)
            .unwrap();
        assert_eq!(session.state(), SessionState::Terminal(TerminalKind::Quit));
        assert!(session.game().history().is_empty());
        assert!(db.list_games("alice").unwrap().is_empty());

        session.start(TimeControl::Untimed).unwrap();
        assert!(session.is_active());
    }

    #[test]
    fn test_listeners_see_lifecycle() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let mut session = SessionController::new();
        session.subscribe(Box::new(move |event| {
            sink.lock().unwrap().push(event.clone());
        }));
        session.start(TimeControl::timed(1)).unwrap();
        assert!(play(&mut session, Square::E2, Square::E4));
        assert!(session.quit_without_saving());

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                SessionEvent::Started {
                    control: TimeControl::Timed { minutes: 1 }
                },
                SessionEvent::ClockStarted,
                SessionEvent::MoveApplied {
                    san: "e4".to_string()
                },
                SessionEvent::ClockStopped,
                SessionEvent::Ended(TerminalKind::Quit),
            ]
        );
    }
}
