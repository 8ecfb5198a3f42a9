use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::GameResult;
use crate::models::{LeaderboardEntry, StatisticsSnapshot};

/// Number of champions shown on the overview.
const OVERVIEW_CHAMPIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsStatus {
    Ready,
    Empty,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub status: StatisticsStatus,
    pub snapshot: Option<StatisticsSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub latest_game: Option<GameResult>,
    pub champions: Vec<LeaderboardEntry>,
}

/// The cached statistics snapshot. Never recomputes.
pub async fn get_statistics(
    State(state): State<AppState>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let snapshot = state.cache.current()?;
    let status = if snapshot.is_some() {
        StatisticsStatus::Ready
    } else {
        StatisticsStatus::Empty
    };
    Ok(Json(StatisticsResponse { status, snapshot }))
}

/// Most recently submitted game plus the top earners from the cache.
pub async fn get_overview(
    State(state): State<AppState>,
) -> Result<Json<OverviewResponse>, ApiError> {
    let latest_game = state
        .games
        .latest_game()?
        .map(|g| GameResult::from_game(&g));

    let champions = state
        .cache
        .current()?
        .map(|s| {
            s.data
                .leaderboard
                .into_iter()
                .take(OVERVIEW_CHAMPIONS)
                .collect()
        })
        .unwrap_or_default();

    Ok(Json(OverviewResponse {
        latest_game,
        champions,
    }))
}
