use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use chess_play_core::session::ReplayViewer;
use chess_play_core::storage::{GameSnapshot, GameStore, GameUpdate};

use super::views::{ReplayFrame, SavedGameView};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReplayQuery {
    /// -1 for the initial position; defaults to the final one.
    pub cursor: Option<isize>,
}

/// GET /api/games
pub async fn list_games(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<SavedGameView>>, AppError> {
    let games = state.db()?.list_games(&user.id)?;
    Ok(Json(games.into_iter().map(SavedGameView::from).collect()))
}

/// POST /api/games
pub async fn create_game(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(snapshot): Json<GameSnapshot>,
) -> Result<(StatusCode, Json<JsonValue>), AppError> {
    let id = state.db()?.create_game(&user.id, &snapshot)?;
    tracing::info!("User {} saved game {}", user.id, id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Game saved successfully", "gameId": id })),
    ))
}

/// GET /api/games/:id
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SavedGameView>, AppError> {
    let game = state.db()?.get_game(&user.id, id)?;
    Ok(Json(game.into()))
}

/// PATCH /api/games/:id
pub async fn update_game(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(update): Json<GameUpdate>,
) -> Result<Json<JsonValue>, AppError> {
    let update = update.validate()?;
    state.db()?.update_game(&user.id, id, &update)?;
    Ok(Json(json!({ "message": "Game updated successfully" })))
}

/// DELETE /api/games/:id
pub async fn delete_game(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<JsonValue>, AppError> {
    state.db()?.delete_game(&user.id, id)?;
    tracing::info!("User {} deleted game {}", user.id, id);
    Ok(Json(json!({ "message": "Game deleted successfully" })))
}

/// GET /api/games/:id/replay?cursor=N
pub async fn replay_game(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Query(query): Query<ReplayQuery>,
) -> Result<Json<ReplayFrame>, AppError> {
    let game = state.db()?.get_game(&user.id, id)?;

    let mut viewer = ReplayViewer::new(game.moves.clone());
    if let Some(cursor) = query.cursor {
        viewer.seek(cursor);
    }
    Ok(Json(ReplayFrame::new(&game, &viewer)))
}
