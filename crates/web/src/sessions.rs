//! Live sessions and their clock tickers
//!
//! Each session owns exactly one controller, addressed by an unguessable
//! random id. A ticker task runs while the controller's clock is running
//! and is aborted as soon as it stops. Sessions that reach a terminal state
//! are dropped from the registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use chess_play_core::{SessionController, SessionState};

pub type SharedSession = Arc<Mutex<SessionController>>;

const TICK: Duration = Duration::from_secs(1);

pub fn lock(session: &SharedSession) -> MutexGuard<'_, SessionController> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Slot {
    session: SharedSession,
    ticker: Option<JoinHandle<()>>,
}

impl Slot {
    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    slots: Mutex<HashMap<String, Slot>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a controller and starts its clock if it should be running.
    pub fn insert(&self, controller: SessionController) -> String {
        let id = {
            let mut slots = self.slots();
            let mut rng = rand::thread_rng();
            let id = loop {
                let candidate = format!("{:016x}{:016x}", rng.gen::<u64>(), rng.gen::<u64>());
                if !slots.contains_key(&candidate) {
                    break candidate;
                }
            };
            slots.insert(
                id.clone(),
                Slot {
                    session: Arc::new(Mutex::new(controller)),
                    ticker: None,
                },
            );
            id
        };
        self.reconcile(&id);
        id
    }

    pub fn get(&self, id: &str) -> Option<SharedSession> {
        self.slots().get(id).map(|slot| Arc::clone(&slot.session))
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts or cancels the ticker to match the controller's clock, and
    /// drops the session once it has ended. Call after every operation that
    /// can change either.
    pub fn reconcile(&self, id: &str) {
        let mut slots = self.slots();
        let slot = match slots.get_mut(id) {
            Some(slot) => slot,
            None => return,
        };

        let (running, ended) = {
            let controller = lock(&slot.session);
            (
                controller.clock_running(),
                matches!(controller.state(), SessionState::Terminal(_)),
            )
        };

        if ended {
            slot.stop_ticker();
            slots.remove(id);
            tracing::debug!("Session {} ended and was dropped", id);
            return;
        }

        let ticking = slot.ticker.as_ref().is_some_and(|t| !t.is_finished());
        if running && !ticking {
            tracing::debug!("Starting clock for session {}", id);
            slot.ticker = Some(spawn_ticker(id.to_string(), Arc::clone(&slot.session)));
        } else if !running && slot.ticker.is_some() {
            tracing::debug!("Stopping clock for session {}", id);
            slot.stop_ticker();
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        match self.slots().remove(id) {
            Some(mut slot) => {
                slot.stop_ticker();
                true
            }
            None => false,
        }
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        for slot in self.slots().values_mut() {
            slot.stop_ticker();
        }
    }
}

fn spawn_ticker(id: String, session: SharedSession) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + TICK, TICK);
        loop {
            interval.tick().await;
            let mut controller = lock(&session);
            if !controller.tick() || !controller.clock_running() {
                break;
            }
        }
        tracing::debug!("Clock for session {} stopped", id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_play_core::{Candidate, Database, TimeControl};
    use shakmaty::Square;

    fn timed_session() -> SessionController {
        let mut controller = SessionController::new();
        controller.start(TimeControl::timed(1)).unwrap();
        controller
    }

    fn has_ticker(registry: &SessionRegistry, id: &str) -> bool {
        registry.slots().get(id).unwrap().ticker.is_some()
    }

    #[tokio::test]
    async fn test_timed_session_gets_ticker() {
        let registry = SessionRegistry::new();
        let id = registry.insert(timed_session());
        assert!(has_ticker(&registry, &id));

        let untimed = registry.insert(SessionController::new());
        assert!(!has_ticker(&registry, &untimed));
    }

    #[tokio::test]
    async fn test_ids_are_distinct_and_opaque() {
        let registry = SessionRegistry::new();
        let first = registry.insert(SessionController::new());
        let second = registry.insert(SessionController::new());
        assert_ne!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_game_over_stops_ticker_but_keeps_session() {
        let registry = SessionRegistry::new();
        let mut controller = SessionController::new();
        controller.start(TimeControl::timed(1)).unwrap();
        let id = registry.insert(controller);
        let session = registry.get(&id).unwrap();

        for (from, to) in [
            (Square::F2, Square::F3),
            (Square::E7, Square::E5),
            (Square::G2, Square::G4),
            (Square::D8, Square::H4),
        ] {
            assert!(lock(&session).try_move(Candidate::new(from, to)));
        }
        registry.reconcile(&id);
        assert!(!has_ticker(&registry, &id));
        assert!(registry.get(&id).is_some());
    }

    #[tokio::test]
    async fn test_ended_sessions_are_dropped() {
        let db = Database::open_in_memory().unwrap();
        let registry = SessionRegistry::new();

        for _ in 0..3 {
            let id = registry.insert(timed_session());
            let session = registry.get(&id).unwrap();
            assert!(lock(&session).try_move(Candidate::new(Square::E2, Square::E4)));
            assert!(lock(&session).quit_without_saving());
            registry.reconcile(&id);
            assert!(registry.get(&id).is_none());
        }

        let id = registry.insert(timed_session());
        let session = registry.get(&id).unwrap();
        lock(&session).save_and_quit(&db, Some("alice")).unwrap();
        registry.reconcile(&id);

        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_session() {
        let registry = SessionRegistry::new();
        let id = registry.insert(timed_session());
        let session = registry.get(&id).unwrap();

        assert!(lock(&session).begin_save(None).is_err());
        registry.reconcile(&id);
        assert_eq!(registry.len(), 1);
        assert!(has_ticker(&registry, &id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_counts_down() {
        let registry = SessionRegistry::new();
        let id = registry.insert(timed_session());
        let session = registry.get(&id).unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(lock(&session).snapshot().white_time, Some(57));
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = SessionRegistry::new();
        let id = registry.insert(timed_session());
        assert!(registry.remove(&id));
        assert!(registry.get(&id).is_none());
        assert!(!registry.remove(&id));
        assert!(registry.is_empty());
    }
}
