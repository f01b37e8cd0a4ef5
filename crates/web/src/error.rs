use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use chess_play_core::Error as CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Core(e) => match e {
                CoreError::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
                CoreError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                CoreError::Unauthenticated => (StatusCode::UNAUTHORIZED, e.to_string()),
                CoreError::InvalidState(msg) => (StatusCode::CONFLICT, msg.to_string()),
                CoreError::Database(_) | CoreError::Json(_) => {
                    tracing::error!("Storage error: {e}");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
                }
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
