use std::sync::Arc;

use crate::cache::StatisticsCache;
use crate::storage::{GameStore, JsonlGameStore, StorageConfig};

#[derive(Clone)]
pub struct AppState {
    pub games: Arc<dyn GameStore>,
    pub cache: Arc<StatisticsCache>,
}

impl AppState {
    /// State backed by the JSONL store under `storage.data_dir`.
    pub fn new(storage: StorageConfig) -> Self {
        Self {
            cache: Arc::new(StatisticsCache::new(&storage)),
            games: Arc::new(JsonlGameStore::new(storage)),
        }
    }
}
