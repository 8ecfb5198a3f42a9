//! Filesystem data store.
//!
//! Handles reading and writing the local archive:
//! - Normalized JSONL game records (source of truth)
//! - The derived statistics snapshot

pub mod games;
pub mod jsonl;
pub mod snapshot;

use std::path::PathBuf;
use thiserror::Error;

use crate::models::{Game, GameId};

pub use games::JsonlGameStore;
pub use snapshot::SnapshotStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn normalized_dir(&self) -> PathBuf {
        self.data_dir.join("normalized")
    }

    pub fn derived_dir(&self) -> PathBuf {
        self.data_dir.join("derived")
    }

    /// One game per line, players embedded.
    pub fn games_path(&self) -> PathBuf {
        self.normalized_dir().join("games.jsonl")
    }

    /// The current statistics snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.derived_dir().join("statistics.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Persistent game storage.
///
/// Inserting a game stores it together with its players in one operation;
/// deleting a game removes its players with it.
pub trait GameStore: Send + Sync {
    /// All games, newest first (air date, then episode number, descending).
    fn list_games(&self) -> Result<Vec<Game>, StorageError>;

    fn get_game(&self, id: &GameId) -> Result<Option<Game>, StorageError>;

    /// The most recently submitted game.
    fn latest_game(&self) -> Result<Option<Game>, StorageError> {
        let games = self.list_games()?;
        Ok(games.into_iter().max_by_key(|g| g.submitted_at))
    }

    /// Store a new game. Fails with [`StorageError::Conflict`] when a game
    /// with the same air date and episode number exists.
    fn insert_game(&self, game: &Game) -> Result<(), StorageError>;

    /// Delete a game and its players. Returns false if it did not exist.
    fn delete_game(&self, id: &GameId) -> Result<bool, StorageError>;
}

/// Newest first: air date, then episode number, descending.
pub fn sort_newest_first(games: &mut [Game]) {
    games.sort_by(|a, b| (b.air_date, b.episode_number).cmp(&(a.air_date, a.episode_number)));
}
