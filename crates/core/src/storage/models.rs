//! Saved game models

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

pub const MAX_NAME_LEN: usize = 16;

/// What a session hands to storage when it is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    #[serde(default)]
    pub fen: String,
    #[serde(default)]
    pub moves: Vec<String>,
    pub white_time: Option<u32>,
    pub black_time: Option<u32>,
    #[serde(default)]
    pub is_timer_enabled: bool,
    #[serde(default)]
    pub is_game_over: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGame {
    pub id: i64,
    pub name: String,
    pub fen: String,
    pub moves: Vec<String>,
    pub white_time: Option<u32>,
    pub black_time: Option<u32>,
    pub is_timer_enabled: bool,
    pub is_game_over: bool,
    /// Unix milliseconds.
    pub updated_at: i64,
}

/// Partial update. Absent fields are left alone; the clock fields
/// distinguish "absent" from an explicit null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    pub name: Option<String>,
    pub fen: Option<String>,
    pub moves: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub white_time: Option<Option<u32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub black_time: Option<Option<u32>>,
    pub is_timer_enabled: Option<bool>,
    pub is_game_over: Option<bool>,
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl GameUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.fen.is_none()
            && self.moves.is_none()
            && self.white_time.is_none()
            && self.black_time.is_none()
            && self.is_timer_enabled.is_none()
            && self.is_game_over.is_none()
    }

    /// Trims the name and checks it, then checks there is anything to write.
    pub fn validate(mut self) -> Result<Self> {
        if let Some(name) = self.name.take() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(Error::InvalidInput("Valid game name is required".to_string()));
            }
            if trimmed.chars().count() > MAX_NAME_LEN {
                return Err(Error::InvalidInput(format!(
                    "Game name cannot exceed {} characters",
                    MAX_NAME_LEN
                )));
            }
            self.name = Some(trimmed.to_string());
        }
        if self.is_empty() {
            return Err(Error::InvalidInput("No update data provided".to_string()));
        }
        Ok(self)
    }
}

impl From<&GameSnapshot> for GameUpdate {
    fn from(snapshot: &GameSnapshot) -> Self {
        Self {
            name: None,
            fen: Some(snapshot.fen.clone()),
            moves: Some(snapshot.moves.clone()),
            white_time: Some(snapshot.white_time),
            black_time: Some(snapshot.black_time),
            is_timer_enabled: Some(snapshot.is_timer_enabled),
            is_game_over: Some(snapshot.is_game_over),
        }
    }
}
