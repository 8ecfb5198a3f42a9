//! Persisted statistics snapshot.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::models::StatisticsSnapshot;

use super::jsonl::write_json_atomic;
use super::{StorageConfig, StorageError};

/// The single authoritative snapshot document at `derived/statistics.json`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.snapshot_path(),
        }
    }

    /// Load the current snapshot.
    ///
    /// A missing file means no snapshot. An unreadable document is treated
    /// the same way; the next rebuild overwrites it.
    pub fn load(&self) -> Result<Option<StatisticsSnapshot>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&self.path)?;
        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!("Ignoring unreadable snapshot {:?}: {}", self.path, e);
                Ok(None)
            }
        }
    }

    /// Replace the current snapshot.
    pub fn save(&self, snapshot: &StatisticsSnapshot) -> Result<(), StorageError> {
        write_json_atomic(&self.path, snapshot)?;
        info!(
            "Saved statistics snapshot through game {}",
            snapshot.through_game
        );
        Ok(())
    }

    /// Remove the snapshot. Returns false if there was none.
    pub fn clear(&self) -> Result<bool, StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Cleared statistics snapshot");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No statistics snapshot to clear");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
