//! Statistics cache.
//!
//! Holds the last computed aggregation as a persisted snapshot. Every write
//! to game data is followed by [`StatisticsCache::rebuild`]; readers only
//! ever load the stored snapshot and never recompute.

use std::time::Instant;

use tracing::info;

use crate::calculate::compute_statistics;
use crate::models::StatisticsSnapshot;
use crate::storage::{GameStore, SnapshotStore, StorageConfig, StorageError};

#[derive(Debug, Clone)]
pub struct StatisticsCache {
    snapshots: SnapshotStore,
}

impl StatisticsCache {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            snapshots: SnapshotStore::new(config),
        }
    }

    /// The authoritative snapshot, if any.
    pub fn current(&self) -> Result<Option<StatisticsSnapshot>, StorageError> {
        self.snapshots.load()
    }

    /// Recompute statistics over every stored game and replace the snapshot.
    ///
    /// With no games left the snapshot is cleared and `None` returned.
    /// Running this twice over an unchanged corpus yields the same payload.
    pub fn rebuild(
        &self,
        games: &dyn GameStore,
    ) -> Result<Option<StatisticsSnapshot>, StorageError> {
        let started = Instant::now();
        let corpus = games.list_games()?;

        let through = corpus
            .iter()
            .max_by_key(|g| g.submitted_at)
            .map(|g| g.id.clone());
        let (Some(through), Some(payload)) = (through, compute_statistics(&corpus)) else {
            self.snapshots.clear()?;
            info!("No games stored; statistics cleared");
            return Ok(None);
        };

        let snapshot = StatisticsSnapshot::new(through, payload);
        self.snapshots.save(&snapshot)?;

        info!(
            "Rebuilt statistics over {} games ({} players) in {:?}",
            snapshot.data.totals.games,
            snapshot.data.totals.players,
            started.elapsed()
        );
        Ok(Some(snapshot))
    }
}
