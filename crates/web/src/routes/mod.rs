use axum::response::IntoResponse;

pub mod games;
pub mod sessions;
pub mod views;

pub async fn health() -> impl IntoResponse {
    "OK"
}
