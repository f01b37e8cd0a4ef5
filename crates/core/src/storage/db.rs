//! Database operations

use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::models::*;
use super::GameStore;
use crate::error::{Error, Result};

const GAME_COLUMNS: &str = "id, name, fen, moves, white_time, black_time, is_timer_enabled, is_game_over, updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS saved_games (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                fen TEXT NOT NULL,
                moves TEXT NOT NULL,
                white_time INTEGER,
                black_time INTEGER,
                is_timer_enabled INTEGER NOT NULL DEFAULT 0,
                is_game_over INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                revision INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_saved_games_user ON saved_games(user_id);
            CREATE INDEX IF NOT EXISTS idx_saved_games_revision ON saved_games(revision);
            "#,
        )?;
        Ok(())
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    /// Write counter; orders records by most recent write even within one millisecond.
    fn next_revision(&self) -> Result<i64> {
        let revision: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(revision), 0) + 1 FROM saved_games",
            [],
            |row| row.get(0),
        )?;
        Ok(revision)
    }

    pub fn count_games(&self, user_id: &str) -> Result<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM saved_games WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn read_game(row: &Row) -> rusqlite::Result<SavedGame> {
        let moves_json: String = row.get(3)?;
        let moves: Vec<String> = serde_json::from_str(&moves_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        Ok(SavedGame {
            id: row.get(0)?,
            name: row.get(1)?,
            fen: row.get(2)?,
            moves,
            white_time: row.get(4)?,
            black_time: row.get(5)?,
            is_timer_enabled: row.get(6)?,
            is_game_over: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl GameStore for Database {
    fn create_game(&self, user_id: &str, snapshot: &GameSnapshot) -> Result<i64> {
        if snapshot.fen.trim().is_empty() {
            return Err(Error::InvalidInput("FEN string is required".to_string()));
        }

        let name = format!("Game {}", self.count_games(user_id)? + 1);
        let now = Self::now();

        self.conn.execute(
            r#"
            INSERT INTO saved_games
            (user_id, name, fen, moves, white_time, black_time, is_timer_enabled, is_game_over,
             created_at, updated_at, revision)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                user_id,
                name,
                snapshot.fen,
                serde_json::to_string(&snapshot.moves)?,
                snapshot.white_time,
                snapshot.black_time,
                snapshot.is_timer_enabled,
                snapshot.is_game_over,
                now,
                now,
                self.next_revision()?,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!("Created saved game {} ({}) for {}", id, name, user_id);
        Ok(id)
    }

    fn update_game(&self, user_id: &str, id: i64, update: &GameUpdate) -> Result<()> {
        let update = update.clone().validate()?;

        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(name) = update.name {
            assignments.push("name = ?");
            values.push(Value::Text(name));
        }
        if let Some(fen) = update.fen {
            assignments.push("fen = ?");
            values.push(Value::Text(fen));
        }
        if let Some(moves) = update.moves {
            assignments.push("moves = ?");
            values.push(Value::Text(serde_json::to_string(&moves)?));
        }
        if let Some(white_time) = update.white_time {
            assignments.push("white_time = ?");
            values.push(white_time.map_or(Value::Null, |t| Value::Integer(t.into())));
        }
        if let Some(black_time) = update.black_time {
            assignments.push("black_time = ?");
            values.push(black_time.map_or(Value::Null, |t| Value::Integer(t.into())));
        }
        if let Some(enabled) = update.is_timer_enabled {
            assignments.push("is_timer_enabled = ?");
            values.push(Value::Integer(enabled.into()));
        }
        if let Some(over) = update.is_game_over {
            assignments.push("is_game_over = ?");
            values.push(Value::Integer(over.into()));
        }

        assignments.push("updated_at = ?");
        values.push(Value::Integer(Self::now()));
        assignments.push("revision = ?");
        values.push(Value::Integer(self.next_revision()?));

        values.push(Value::Integer(id));
        values.push(Value::Text(user_id.to_string()));

        let sql = format!(
            "UPDATE saved_games SET {} WHERE id = ? AND user_id = ?",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(values.iter()))?;

        if changed == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn get_game(&self, user_id: &str, id: i64) -> Result<SavedGame> {
        let sql = format!(
            "SELECT {} FROM saved_games WHERE id = ?1 AND user_id = ?2",
            GAME_COLUMNS
        );
        self.conn
            .query_row(&sql, params![id, user_id], Self::read_game)
            .optional()?
            .ok_or(Error::NotFound)
    }

    fn list_games(&self, user_id: &str) -> Result<Vec<SavedGame>> {
        let sql = format!(
            "SELECT {} FROM saved_games WHERE user_id = ?1 ORDER BY revision DESC",
            GAME_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let games = stmt
            .query_map(params![user_id], Self::read_game)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(games)
    }

    fn delete_game(&self, user_id: &str, id: i64) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM saved_games WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}
