use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shakmaty::Square;

use chess_play_core::session::{ConfirmationPrompt, ResumeParams};
use chess_play_core::{Candidate, Error as CoreError, SessionController, TimeControl};

use super::views::SessionView;
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::error::AppError;
use crate::sessions::{lock, SharedSession};
use crate::AppState;

const DEFAULT_MINUTES: u32 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionRequest {
    #[serde(default)]
    pub timer_enabled: bool,
    pub minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub accepted: bool,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct DestinationsQuery {
    pub from: String,
}

#[derive(Debug, Serialize)]
pub struct DestinationsResponse {
    pub from: String,
    pub destinations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptQuery {
    /// "quit" (default) or "leave".
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub message: &'static str,
    pub game_id: i64,
    pub session: SessionView,
}

fn find(state: &AppState, sid: &str) -> Result<SharedSession, AppError> {
    state
        .sessions
        .get(sid)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

fn view(sid: &str, session: &SharedSession) -> SessionView {
    SessionView::new(sid, &lock(session))
}

/// POST /api/sessions
pub async fn new_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let control = if req.timer_enabled {
        TimeControl::timed(req.minutes.unwrap_or(DEFAULT_MINUTES))
    } else {
        TimeControl::Untimed
    };

    let mut controller = SessionController::new();
    controller.start(control)?;

    let sid = state.sessions.insert(controller);
    let session = find(&state, &sid)?;
    Ok((StatusCode::CREATED, Json(view(&sid, &session))))
}

/// POST /api/sessions/resume?gameId=..&moves=..
pub async fn resume_session(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<ResumeParams>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let mut controller = SessionController::new();
    {
        let db = state.db()?;
        controller.resume_saved(&*db, &user.id, &params)?;
    }

    let sid = state.sessions.insert(controller);
    let session = find(&state, &sid)?;
    Ok((StatusCode::CREATED, Json(view(&sid, &session))))
}

/// GET /api/sessions/:sid
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = find(&state, &sid)?;
    Ok(Json(view(&sid, &session)))
}

/// GET /api/sessions/:sid/destinations?from=e2
pub async fn destinations(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<String>,
    Query(query): Query<DestinationsQuery>,
) -> Result<Json<DestinationsResponse>, AppError> {
    let from: Square = query
        .from
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid square: {}", query.from)))?;

    let session = find(&state, &sid)?;
    let destinations = lock(&session)
        .legal_destinations(from)
        .into_iter()
        .map(|sq| sq.to_string())
        .collect();

    Ok(Json(DestinationsResponse {
        from: from.to_string(),
        destinations,
    }))
}

/// POST /api/sessions/:sid/moves
pub async fn make_move(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, AppError> {
    let candidate = Candidate::parse(&req.from, &req.to, req.promotion.as_deref())
        .ok_or_else(|| AppError::BadRequest("Invalid move".to_string()))?;

    let session = find(&state, &sid)?;
    let accepted = lock(&session).try_move(candidate);
    state.sessions.reconcile(&sid);

    Ok(Json(MoveResponse {
        accepted,
        session: view(&sid, &session),
    }))
}

/// GET /api/sessions/:sid/prompt?kind=quit|leave
pub async fn prompt(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<String>,
    user: MaybeAuthUser,
    Query(query): Query<PromptQuery>,
) -> Result<Json<ConfirmationPrompt>, AppError> {
    let session = find(&state, &sid)?;
    let controller = lock(&session);
    let signed_in = user.0.is_some();

    let prompt = match query.kind.as_deref() {
        None | Some("quit") => controller.quit_prompt(signed_in),
        Some("leave") => controller.leave_prompt(signed_in),
        Some(other) => {
            return Err(AppError::BadRequest(format!("Unknown prompt: {}", other)));
        }
    };
    Ok(Json(prompt))
}

/// POST /api/sessions/:sid/quit
pub async fn quit(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = find(&state, &sid)?;
    let quit = lock(&session).quit_without_saving();
    state.sessions.reconcile(&sid);

    if !quit {
        return Err(AppError::Conflict("No active game to quit".to_string()));
    }
    tracing::info!("Session {} quit without saving", sid);
    Ok(Json(view(&sid, &session)))
}

/// POST /api/sessions/:sid/save
///
/// The session lock is released while storage runs, so a second save
/// arriving meanwhile sees the in-flight flag and is turned away.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<String>,
    user: MaybeAuthUser,
) -> Result<Json<SaveResponse>, AppError> {
    let session = find(&state, &sid)?;

    let request = lock(&session)
        .begin_save(user.id())?
        .ok_or_else(|| AppError::Conflict("Save already in progress".to_string()))?;

    let result = match state.db() {
        Ok(db) => request.execute(&*db),
        Err(_) => Err(CoreError::InvalidState("Storage unavailable")),
    };

    let game_id = lock(&session).finish_save(result)?;
    state.sessions.reconcile(&sid);

    Ok(Json(SaveResponse {
        message: "Game saved",
        game_id,
        session: view(&sid, &session),
    }))
}
