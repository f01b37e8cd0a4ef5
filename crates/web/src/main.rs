use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use chess_play_core::Database;
use chess_play_web::{build_router, config::Config, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    tracing::info!("Opening database at {}", config.database_path);
    let db = Database::open(&config.database_path).expect("Failed to open database");

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(db, config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Server running at http://{}", addr);

    axum::serve(listener, app).await.expect("Server error");
}
