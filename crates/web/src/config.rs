use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_path: String,
    pub host: String,
    pub port: u16,
    /// Header the auth proxy puts the signed-in user's id in.
    pub user_header: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "chess_play.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            user_header: "x-user-id".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_path: env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            user_header: env::var("USER_HEADER")
                .map(|h| h.to_ascii_lowercase())
                .unwrap_or(defaults.user_header),
        }
    }
}
