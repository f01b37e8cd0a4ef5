//! HTTP surface for chess sessions and saved games

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use chess_play_core::Database;

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod sessions;

use config::Config;
use error::AppError;
use sessions::SessionRegistry;

pub struct AppState {
    pub db: Mutex<Database>,
    pub sessions: SessionRegistry,
    pub config: Config,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db: Mutex::new(db),
            sessions: SessionRegistry::new(),
            config,
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Database>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal("Database lock poisoned".to_string()))
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/games",
            get(routes::games::list_games).post(routes::games::create_game),
        )
        .route(
            "/api/games/:id",
            get(routes::games::get_game)
                .patch(routes::games::update_game)
                .delete(routes::games::delete_game),
        )
        .route("/api/games/:id/replay", get(routes::games::replay_game))
        .route("/api/sessions", post(routes::sessions::new_session))
        .route("/api/sessions/resume", post(routes::sessions::resume_session))
        .route("/api/sessions/:sid", get(routes::sessions::get_session))
        .route(
            "/api/sessions/:sid/destinations",
            get(routes::sessions::destinations),
        )
        .route("/api/sessions/:sid/moves", post(routes::sessions::make_move))
        .route("/api/sessions/:sid/prompt", get(routes::sessions::prompt))
        .route("/api/sessions/:sid/quit", post(routes::sessions::quit))
        .route("/api/sessions/:sid/save", post(routes::sessions::save))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
