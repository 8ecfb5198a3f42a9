//! JSONL-backed game store.

use std::sync::Mutex;

use tracing::{debug, info};

use crate::models::{Game, GameId};

use super::jsonl::{JsonlReader, JsonlWriter};
use super::{sort_newest_first, GameStore, StorageConfig, StorageError};

/// Stores every game, with its players embedded, as one line of
/// `normalized/games.jsonl`.
///
/// Writes rewrite the whole file through a temp-and-rename commit while
/// holding the writer lock, so an insert or delete is all-or-nothing.
/// A write refuses to run over a file with unparseable lines.
pub struct JsonlGameStore {
    config: StorageConfig,
    write_lock: Mutex<()>,
}

impl JsonlGameStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    fn reader(&self) -> JsonlReader<Game> {
        JsonlReader::new(self.config.games_path())
    }

    fn writer(&self) -> JsonlWriter<Game> {
        JsonlWriter::new(self.config.games_path())
    }
}

impl GameStore for JsonlGameStore {
    fn list_games(&self) -> Result<Vec<Game>, StorageError> {
        let mut games = self.reader().read_all()?;
        sort_newest_first(&mut games);
        Ok(games)
    }

    fn get_game(&self, id: &GameId) -> Result<Option<Game>, StorageError> {
        let found = self.reader().read_where(|g| &g.id == id)?;
        Ok(found.into_iter().next())
    }

    fn insert_game(&self, game: &Game) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut games = self.reader().read_all_strict()?;
        let duplicate = games.iter().any(|g| {
            g.id == game.id
                || (g.air_date == game.air_date && g.episode_number == game.episode_number)
        });
        if duplicate {
            return Err(StorageError::Conflict(format!(
                "episode {} on {} already exists",
                game.episode_number, game.air_date
            )));
        }

        games.push(game.clone());
        self.writer().write_all(&games)?;

        info!(
            "Stored game {} ({} episode {}, {} players)",
            game.id,
            game.air_date,
            game.episode_number,
            game.players.len()
        );
        Ok(())
    }

    fn delete_game(&self, id: &GameId) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let games = self.reader().read_all_strict()?;
        let before = games.len();
        let remaining: Vec<Game> = games.into_iter().filter(|g| &g.id != id).collect();
        if remaining.len() == before {
            debug!("Game {} not found for deletion", id);
            return Ok(false);
        }

        self.writer().write_all(&remaining)?;
        info!("Deleted game {} ({} games remain)", id, remaining.len());
        Ok(true)
    }
}
