//! SQLite storage for saved games

mod db;
mod models;

pub use db::Database;
pub use models::*;

use crate::error::Result;

/// Persistence seam used by the session core.
///
/// Every operation is scoped to the owning user; a record owned by somebody
/// else is reported exactly like a missing one.
pub trait GameStore {
    /// Creates a record named "Game N" and returns its id.
    fn create_game(&self, user_id: &str, snapshot: &GameSnapshot) -> Result<i64>;

    fn update_game(&self, user_id: &str, id: i64, update: &GameUpdate) -> Result<()>;

    fn get_game(&self, user_id: &str, id: i64) -> Result<SavedGame>;

    /// Most recently updated first.
    fn list_games(&self, user_id: &str) -> Result<Vec<SavedGame>>;

    fn delete_game(&self, user_id: &str, id: i64) -> Result<()>;
}
